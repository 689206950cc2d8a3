use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use metallo_core::retrieval::{self, Neighborhood, NeighborDetail};
use metallo_core::{divergences, export, Error, ExportOptions, MetalloConfig, Scored};
use metallo_storage::StorageManager;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state of every handler
pub struct AppState {
    pub storage: Arc<StorageManager>,
    pub config: Arc<MetalloConfig>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PassageResponse {
    pub urn: String,
    pub text: String,
    pub items: Vec<RelatedItem>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RelatedItem {
    pub id: String,
    pub rank: usize,
    pub distance: String,
    pub text: String,
}

impl From<&Neighborhood> for PassageResponse {
    fn from(hood: &Neighborhood) -> Self {
        let items = hood
            .neighbors
            .iter()
            .enumerate()
            .map(|(rank, scored)| RelatedItem {
                id: scored.record.id.clone(),
                rank,
                distance: if rank == 0 {
                    "0".to_string()
                } else {
                    format!("{:.2}", scored.score)
                },
                text: scored.record.text.clone(),
            })
            .collect();

        Self {
            urn: hood.query.id.clone(),
            text: hood.query.text.clone(),
            items,
        }
    }
}

#[derive(Serialize)]
struct DetailResponse {
    urn: String,
    metric: String,
    items: Vec<NeighborDetail>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(
        storage: Arc<StorageManager>,
        config: Arc<MetalloConfig>,
    ) -> std::io::Result<()> {
        let bind = (config.host.clone(), config.port);
        let state = web::Data::new(AppState { storage, config });

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(Self::routes)
        })
        .bind(bind)?
        .run()
        .await
    }

    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/", web::get().to(index))
            .route("/view/{urn}/{count}", web::get().to(view_details))
            .route("/view/{urn}/{count}/json", web::get().to(view_json))
            .route("/topic/{topic}/{count}", web::get().to(view_topic))
            .route("/divergenceJS", web::get().to(divergence_json))
            .route("/divergenceCSV", web::get().to(divergence_csv));
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::RecordNotFound(_) => HttpResponse::NotFound().json(body),
        Error::InsufficientCorpusSize { .. } | Error::TopicOutOfRange { .. } => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn blocking_failed(e: actix_web::error::BlockingError) -> HttpResponse {
    warn!("Blocking task failed: {}", e);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": e.to_string()
    }))
}

async fn index() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Index Page"))
}

async fn neighborhood(
    state: &web::Data<AppState>,
    urn: String,
    count: usize,
) -> Result<Result<Neighborhood, Error>, HttpResponse> {
    let state = state.clone();
    web::block(move || {
        let store = state.storage.store();
        retrieval::nearest_neighbors(store.as_ref(), &urn, count, &state.config.metric())
    })
    .await
    .map_err(blocking_failed)
}

async fn view_json(
    state: web::Data<AppState>,
    path: web::Path<(String, usize)>,
) -> ActixResult<HttpResponse> {
    let (urn, count) = path.into_inner();

    match neighborhood(&state, urn, count).await {
        Ok(Ok(hood)) => Ok(HttpResponse::Ok().json(PassageResponse::from(&hood))),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(response) => Ok(response),
    }
}

async fn view_details(
    state: web::Data<AppState>,
    path: web::Path<(String, usize)>,
) -> ActixResult<HttpResponse> {
    let (urn, count) = path.into_inner();

    match neighborhood(&state, urn, count).await {
        Ok(Ok(hood)) => {
            let items = retrieval::neighbor_details(
                &hood,
                state.storage.topics(),
                state.config.significance,
                state.config.dim_weight,
            );
            Ok(HttpResponse::Ok().json(DetailResponse {
                urn: hood.query.id.clone(),
                metric: state.config.metric().to_string(),
                items,
            }))
        }
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(response) => Ok(response),
    }
}

/// Plain-text ranking, one block per record:
/// `Rank n:`, the ID, the scaled topic weight, the text
pub fn render_topic_ranking(topic: usize, ranking: &[Scored], dim_weight: f64) -> String {
    ranking
        .iter()
        .enumerate()
        .map(|(idx, scored)| {
            format!(
                "Rank {}:\n{}\nTopic{}: {:.3} percent\n{}",
                idx + 1,
                scored.record.id,
                topic,
                scored.score * dim_weight,
                scored.record.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn view_topic(
    state: web::Data<AppState>,
    path: web::Path<(usize, usize)>,
) -> ActixResult<HttpResponse> {
    let (topic, count) = path.into_inner();
    let worker_state = state.clone();

    let ranking = web::block(move || {
        let store = worker_state.storage.store();
        retrieval::top_by_topic(store.as_ref(), topic, count)
    })
    .await;

    match ranking {
        Ok(Ok(ranking)) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(render_topic_ranking(topic, &ranking, state.config.dim_weight))),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(e) => Ok(blocking_failed(e)),
    }
}

async fn divergence_json(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let state = state.into_inner();

    let edges = web::block(move || {
        let corpus = state.storage.corpus()?;
        Ok::<_, Error>(divergences(
            &corpus,
            &state.config.divergence_metric(),
            state.config.div_max,
        ))
    })
    .await;

    match edges {
        Ok(Ok(edges)) => Ok(HttpResponse::Ok().json(edges)),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(e) => Ok(blocking_failed(e)),
    }
}

async fn divergence_csv(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let state = state.into_inner();

    let summary = web::block(move || {
        let corpus = state.storage.corpus()?;
        let output = state.storage.shard_directory(&state.config)?;
        let options = ExportOptions::from_config(&state.config, corpus.len());
        info!("Writing shards to {:?}", output.path());
        export(&corpus, &output, &options)
    })
    .await;

    match summary {
        Ok(Ok(summary)) if summary.is_complete() => Ok(HttpResponse::Ok().json(summary)),
        Ok(Ok(summary)) => Ok(HttpResponse::InternalServerError().json(summary)),
        Ok(Err(e)) => Ok(error_response(&e)),
        Err(e) => Ok(blocking_failed(e)),
    }
}
