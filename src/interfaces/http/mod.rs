use crate::application::SharedVenueSession;
use crate::domain::error::AppError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::sinks::{MarkerBoard, VenueListView};
use crate::infrastructure::source::CsvSource;
use actix_cors::Cors;
use actix_web::{dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;
const EXPORT_FILE_NAME: &str = "venues-updated.csv";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub session: SharedVenueSession,
    pub map: MarkerBoard,
    pub list: VenueListView,
    pub config: AppConfig,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize, Default)]
pub struct LoadRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct FilterRequest {
    #[validate(length(max = 200))]
    pub genre: String,
}

#[derive(Deserialize, Validate)]
pub struct GenreEditRequest {
    #[validate(length(max = 200))]
    pub genre: String,
}

#[derive(Serialize)]
pub struct FilterResponse {
    pub selected: String,
    pub visible_ids: Vec<u64>,
}

fn error_response(err: &AppError) -> HttpResponse {
    match err {
        AppError::SourceUnavailable(_) => HttpResponse::BadGateway().body(err.to_string()),
        AppError::ParseError(_) | AppError::ValidationError(_) => {
            HttpResponse::UnprocessableEntity().body(err.to_string())
        }
        AppError::EditTargetMissing(_) | AppError::NotFound(_) => {
            HttpResponse::NotFound().body(err.to_string())
        }
        _ => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[post("/load")]
async fn load(data: web::Data<HttpState>, req: Option<web::Json<LoadRequest>>) -> impl Responder {
    let source = match req.and_then(|req| req.into_inner().url) {
        Some(url) => match CsvSource::remote(&url) {
            Ok(source) => source,
            Err(e) => {
                add_log(&data.logs, "WARN", "Catalog", &e.to_string());
                return error_response(&e);
            }
        },
        None => CsvSource::from_location(&data.config.csv_source),
    };

    add_log(
        &data.logs,
        "INFO",
        "Catalog",
        &format!("Loading venues from {}", source.describe()),
    );

    match data.session.load(source).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Catalog",
                &format!("Error loading CSV: {}", e),
            );
            error_response(&e)
        }
    }
}

#[post("/upload")]
async fn upload(data: web::Data<HttpState>, body: web::Bytes) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "Catalog",
        &format!("Loading uploaded CSV ({} bytes)", body.len()),
    );

    match data.session.load(CsvSource::Bytes(body.to_vec())).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Catalog",
                &format!("Error loading CSV: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/venues")]
async fn list_venues(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.session.observe(|| data.list.snapshot()))
}

#[get("/genres")]
async fn list_genres(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.session.genres())
}

#[put("/filter")]
async fn set_filter(data: web::Data<HttpState>, req: web::Json<FilterRequest>) -> impl Responder {
    if let Err(e) = req.validate() {
        return HttpResponse::UnprocessableEntity().body(e.to_string());
    }

    let visible_ids = data.session.set_filter(&req.genre);
    HttpResponse::Ok().json(FilterResponse {
        selected: req.genre.clone(),
        visible_ids,
    })
}

#[get("/venues/{id}/edit")]
async fn begin_edit(data: web::Data<HttpState>, path: web::Path<u64>) -> impl Responder {
    match data.session.begin_edit(path.into_inner()) {
        Ok(target) => HttpResponse::Ok().json(target),
        Err(e) => error_response(&e),
    }
}

#[put("/venues/{id}/genre")]
async fn edit_genre(
    data: web::Data<HttpState>,
    path: web::Path<u64>,
    req: web::Json<GenreEditRequest>,
) -> impl Responder {
    if let Err(e) = req.validate() {
        return HttpResponse::UnprocessableEntity().body(e.to_string());
    }

    let id = path.into_inner();
    match data.session.edit_genre(id, &req.genre) {
        Ok(venue) => {
            add_log(
                &data.logs,
                "INFO",
                "Catalog",
                &format!("Genre of venue {} set to '{}'", id, venue.genre()),
            );
            HttpResponse::Ok().json(venue)
        }
        Err(e) => {
            add_log(&data.logs, "WARN", "Catalog", &e.to_string());
            error_response(&e)
        }
    }
}

#[post("/venues/{id}/zoom")]
async fn zoom_to(data: web::Data<HttpState>, path: web::Path<u64>) -> impl Responder {
    let id = path.into_inner();
    match data
        .session
        .with(|session| session.zoom_to(id).map(|()| data.map.snapshot()))
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => error_response(&e),
    }
}

#[post("/venues/{id}/open")]
async fn open_marker(data: web::Data<HttpState>, path: web::Path<u64>) -> impl Responder {
    let id = path.into_inner();
    match data
        .session
        .with(|session| session.open_marker(id).map(|()| data.map.snapshot()))
    {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => error_response(&e),
    }
}

#[get("/map")]
async fn map_state(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.session.observe(|| data.map.snapshot()))
}

#[get("/export")]
async fn export_csv(data: web::Data<HttpState>) -> impl Responder {
    match data.session.export_csv() {
        Ok(text) => {
            add_log(&data.logs, "INFO", "Export", "CSV export generated");
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ))
                .body(text)
        }
        Err(e) => error_response(&e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap_or_else(PoisonError::into_inner);
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(PoisonError::into_inner);
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(load)
            .service(upload)
            .service(list_venues)
            .service(list_genres)
            .service(set_filter)
            .service(begin_edit)
            .service(edit_genre)
            .service(zoom_to)
            .service(open_marker)
            .service(map_state)
            .service(export_csv)
            .service(get_logs),
    );
}

pub fn start_server(state: HttpState) -> std::io::Result<Server> {
    let bind = (state.config.http.host.clone(), state.config.http.port);
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Local tool, any origin

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run();

    Ok(server)
}
