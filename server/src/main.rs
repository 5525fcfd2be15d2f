use std::path::PathBuf;

use actix_web::{
    get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    middleware::Logger,
    post, web, App, HttpResponse, HttpServer, Responder,
};
use clap::Parser;
use url::Url;

mod files;
mod payloads;
mod records;
mod sheets;

use files::PhotoStore;
use payloads::*;
use records::{Endpoint, PostResponse};
use sheets::Workbook;

type ReferenceResp = ErrorablePayload<ReferenceDataResponse>;

#[get("/")]
async fn reference(ctx: web::Data<Endpoint>) -> impl Responder {
    ReferenceResp::from(ctx.reference_data().await).to_response()
}

type PostResp = ErrorablePayload<PostResponse>;

/// Every write goes through here. The body is read raw so that any
/// `Content-Type` is accepted.
#[post("/")]
async fn write(ctx: web::Data<Endpoint>, body: web::Bytes) -> impl Responder {
    PostResp::from(ctx.handle_post(&body).await).to_response()
}

#[get("/photos/{file_id}")]
async fn photo(ctx: web::Data<Endpoint>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match ctx.photos().read(&id).await {
        Ok(Some(blob)) => HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(blob.file_name)],
            })
            .body(blob.bytes),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(e) => {
            log::error!("reading photo {id}: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(reference).service(write).service(photo);
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "JOBSITE_BIND", default_value = "127.0.0.1:7000")]
    bind: String,

    /// Holds the sheets and the stored photos
    #[arg(long, env = "JOBSITE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Base of the photo links handed out, defaults to http://<bind>
    #[arg(long, env = "JOBSITE_PUBLIC_URL")]
    public_url: Option<Url>,

    /// Largest accepted request body
    #[arg(long, env = "JOBSITE_MAX_PAYLOAD_MB", default_value_t = 50)]
    max_payload_mb: usize,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let public_url = args
        .public_url
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("http://{}", args.bind));
    let endpoint = Endpoint::new(
        Workbook::open(args.data_dir.join("sheets")).await?,
        PhotoStore::open(args.data_dir.join("photos"), &public_url).await?,
    );
    let ctx = web::Data::new(endpoint);
    let limit = args.max_payload_mb * 1024 * 1024;

    log::info!(
        "serving {} on {} (photo links under {public_url})",
        args.data_dir.display(),
        args.bind
    );
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(ctx.clone())
            .app_data(web::PayloadConfig::new(limit))
            .configure(routes)
    })
    .bind(&args.bind)?
    .run()
    .await
}
