// bazaar/app/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{product_handlers, purchase_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Malformed bodies, query strings and path segments all surface as 400s in
// the same JSON shape as every other error.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("malformed JSON body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("malformed query string: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
      AppError::Validation(format!("malformed path parameter: {}", err)).into()
    }));
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);
  cfg.service(
    web::scope("/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/product")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::patch().to(product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler))
          .route("/{product_id}/stock", web::post().to(product_handlers::update_stock_handler))
          .route("/{product_id}/buy", web::post().to(purchase_handlers::buy_product_handler)),
      ),
  );
}
