/// Splits free-text materials into discrete items.
///
/// Lines are the primary separator. Only when the text holds a single line is
/// it split on commas instead. Items are trimmed and empty items dropped.
pub fn parse_materials_list(text: &str) -> Vec<String> {
    let mut items: Vec<&str> = text.split('\n').collect();
    if items.len() == 1 {
        items = text.split(',').collect();
    }
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
