// bazaar/app/src/web/tests.rs

use actix_web::http::StatusCode;
use actix_web::{test, web::Data, App};
use bazaar::store::{CatalogStore, PurchaseTx};
use bazaar::{MemoryMarketStore, ProductCondition, ProductDraft};
use serde_json::{json, Value};
use std::sync::Arc;

use super::configure_app_routes;
use crate::config::AppConfig;
use crate::state::AppState;

const PROOF_URL: &str = "https://cdn.example.com/proofs/transfer.jpg";

struct Fixture {
  store: Arc<MemoryMarketStore>,
  state: AppState,
  seller: i64,
  buyer: i64,
  bank: i64,
}

fn fixture(purchase_deadline_ms: &str) -> Fixture {
  let config = AppConfig::from_lookup(|name| match name {
    "DATABASE_URL" => Some("postgres://unused".to_string()),
    "PURCHASE_DEADLINE_MS" => Some(purchase_deadline_ms.to_string()),
    _ => None,
  })
  .unwrap();
  let store = Arc::new(MemoryMarketStore::new());
  let seller = store.add_user("seller01", "Sari Seller");
  let buyer = store.add_user("buyer01", "Budi Buyer");
  let bank = store.add_bank_account(seller.id, "BCA", "Sari Seller", "1234567890");
  let state = AppState::new(store.clone(), store.clone(), Arc::new(config));
  Fixture {
    store,
    state,
    seller: seller.id,
    buyer: buyer.id,
    bank: bank.id,
  }
}

fn draft(name: &str, price: i64, stock: i64) -> ProductDraft {
  ProductDraft {
    name: name.to_string(),
    price,
    image_url: "https://cdn.example.com/p.jpg".to_string(),
    stock,
    condition: ProductCondition::New,
    tags: vec!["kitchen".to_string()],
    is_purchasable: true,
  }
}

fn product_body(name: &str, price: i64, stock: i64) -> Value {
  json!({
    "name": name,
    "price": price,
    "imageUrl": "https://cdn.example.com/p.jpg",
    "stock": stock,
    "condition": "new",
    "tags": ["kitchen", "wood"],
    "isPurchaseable": true
  })
}

#[actix_web::test]
async fn health_reports_ok() {
  let f = fixture("10000");
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;

  let resp = test::call_service(&app, test::TestRequest::get().uri("/v1/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn create_needs_a_caller_and_valid_input() {
  let f = fixture("10000");
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;

  let anonymous = test::TestRequest::post()
    .uri("/v1/product")
    .set_json(product_body("Walnut chopping board", 150_000, 3))
    .to_request();
  assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

  let garbled = test::TestRequest::post()
    .uri("/v1/product")
    .insert_header(("X-User-ID", "not-a-number"))
    .set_json(product_body("Walnut chopping board", 150_000, 3))
    .to_request();
  assert_eq!(test::call_service(&app, garbled).await.status(), StatusCode::UNAUTHORIZED);

  let created = test::TestRequest::post()
    .uri("/v1/product")
    .insert_header(("X-User-ID", f.seller.to_string()))
    .set_json(product_body("Walnut chopping board", 150_000, 3))
    .to_request();
  let resp = test::call_service(&app, created).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["name"], "Walnut chopping board");
  assert_eq!(body["data"]["isPurchaseable"], true);
  assert_eq!(body["data"]["purchaseCount"], 0);
  assert!(body["data"]["productId"].is_string());

  let duplicate = test::TestRequest::post()
    .uri("/v1/product")
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .set_json(product_body("Walnut chopping board", 10, 1))
    .to_request();
  assert_eq!(test::call_service(&app, duplicate).await.status(), StatusCode::BAD_REQUEST);

  let mut bad_condition = product_body("Acacia serving tray", 10, 1);
  bad_condition["condition"] = json!("used");
  let req = test::TestRequest::post()
    .uri("/v1/product")
    .insert_header(("X-User-ID", f.seller.to_string()))
    .set_json(bad_condition)
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let unknown_owner = test::TestRequest::post()
    .uri("/v1/product")
    .insert_header(("X-User-ID", "9999"))
    .set_json(product_body("Beech rolling pin", 10, 1))
    .to_request();
  assert_eq!(test::call_service(&app, unknown_owner).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_applies_the_query_and_reports_meta() {
  let f = fixture("10000");
  for (name, price) in [("Acacia serving tray", 100), ("Walnut chopping board", 150), ("Olive wood spoon set", 200)] {
    f.state.catalog.create_product(f.seller, draft(name, price, 2)).await.unwrap();
  }
  f.state.catalog.create_product(f.buyer, draft("Sold out candle holder", 50, 0)).await.unwrap();
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;

  let req = test::TestRequest::get()
    .uri("/v1/product?sortBy=price&orderBy=desc&limit=2&tags=kitchen")
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let prices: Vec<i64> = body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["price"].as_i64().unwrap())
    .collect();
  assert_eq!(prices, vec![200, 150]);
  assert_eq!(body["meta"]["total"], 3);
  assert_eq!(body["meta"]["limit"], 2);
  assert_eq!(body["meta"]["offset"], 0);

  // Own products only, empty stock included.
  let req = test::TestRequest::get()
    .uri("/v1/product?userOnly=true&showEmptyStock=true")
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["meta"]["total"], 1);
  assert_eq!(body["data"][0]["name"], "Sold out candle holder");

  // A malformed optional caller is treated as anonymous.
  let req = test::TestRequest::get()
    .uri("/v1/product?userOnly=true")
    .insert_header(("X-User-ID", "nobody"))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["meta"]["total"], 3);

  for bad in ["/v1/product?limit=-1", "/v1/product?sortBy=name", "/v1/product?condition=used"] {
    let resp = test::call_service(&app, test::TestRequest::get().uri(bad).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", bad);
  }
}

#[actix_web::test]
async fn detail_includes_the_seller_summary() {
  let f = fixture("10000");
  let p = f.state.catalog.create_product(f.seller, draft("Enamel coffee pot", 200_000, 5)).await.unwrap();
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;

  let resp = test::call_service(
    &app,
    test::TestRequest::get().uri(&format!("/v1/product/{}", p.id)).to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["product"]["productId"], p.id.to_string());
  assert_eq!(body["data"]["seller"]["name"], "Sari Seller");
  assert_eq!(body["data"]["seller"]["productSoldTotal"], 0);
  assert_eq!(body["data"]["seller"]["bankAccounts"][0]["bankAccountId"], f.bank.to_string());
  assert_eq!(body["data"]["seller"]["bankAccounts"][0]["bankName"], "BCA");

  let missing = test::call_service(&app, test::TestRequest::get().uri("/v1/product/424242").to_request()).await;
  assert_eq!(missing.status(), StatusCode::NOT_FOUND);

  let malformed = test::call_service(&app, test::TestRequest::get().uri("/v1/product/abc").to_request()).await;
  assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn only_the_owner_can_change_a_product() {
  let f = fixture("10000");
  let p = f.state.catalog.create_product(f.seller, draft("Bamboo bookshelf", 800_000, 2)).await.unwrap();
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;
  let uri = format!("/v1/product/{}", p.id);

  let req = test::TestRequest::patch()
    .uri(&uri)
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .set_json(product_body("Bamboo bookshelf XL", 850_000, 4))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::patch()
    .uri(&uri)
    .insert_header(("X-User-ID", f.seller.to_string()))
    .set_json(product_body("Bamboo bookshelf XL", 850_000, 4))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["data"]["name"], "Bamboo bookshelf XL");
  assert_eq!(body["data"]["stock"], 4);

  let req = test::TestRequest::post()
    .uri(&format!("{}/stock", uri))
    .insert_header(("X-User-ID", f.seller.to_string()))
    .set_json(json!({ "stock": 9 }))
    .to_request();
  let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
  assert_eq!(body["data"]["stock"], 9);

  let req = test::TestRequest::post()
    .uri(&format!("{}/stock", uri))
    .insert_header(("X-User-ID", f.seller.to_string()))
    .set_json(json!({ "stock": -1 }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::delete()
    .uri(&uri)
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::delete()
    .uri(&uri)
    .insert_header(("X-User-ID", f.seller.to_string()))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

  let gone = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
  assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn buy_records_a_receipt_and_maps_failures() {
  let f = fixture("10000");
  let p = f.state.catalog.create_product(f.seller, draft("Cast iron skillet", 450_000, 3)).await.unwrap();
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;
  let uri = format!("/v1/product/{}/buy", p.id);
  let buy = |bank: Value, quantity: i64| {
    json!({ "bankAccountId": bank, "paymentProofImageUrl": PROOF_URL, "quantity": quantity })
  };

  let req = test::TestRequest::post()
    .uri(&uri)
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .set_json(buy(json!(f.bank.to_string()), 2))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["data"]["quantity"], 2);
  assert_eq!(body["data"]["productName"], "Cast iron skillet");
  assert_eq!(body["data"]["bankAccountNumber"], "1234567890");
  assert_eq!(f.store.payments().len(), 1);
  assert_eq!(f.store.payments()[0].buyer_id, Some(f.buyer));
  assert_eq!(f.store.find_product(p.id).await.unwrap().unwrap().stock, 1);

  let cases = [
    (Some(f.buyer), buy(json!(f.bank), 2), StatusCode::BAD_REQUEST), // only 1 left
    (Some(f.buyer), buy(json!("999"), 1), StatusCode::NOT_FOUND),
    (Some(f.buyer), buy(json!("BCA"), 1), StatusCode::BAD_REQUEST),
    (Some(f.buyer), buy(json!(f.bank), 0), StatusCode::BAD_REQUEST),
    (None, buy(json!(f.bank), 1), StatusCode::UNAUTHORIZED),
  ];
  for (caller, payload, expected) in cases {
    let mut req = test::TestRequest::post().uri(&uri).set_json(payload.clone());
    if let Some(id) = caller {
      req = req.insert_header(("X-User-ID", id.to_string()));
    }
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), expected, "{}", payload);
  }
  assert_eq!(f.store.payments().len(), 1);
}

#[actix_web::test]
async fn buy_past_its_deadline_is_unavailable() {
  let f = fixture("50");
  let p = f.state.catalog.create_product(f.seller, draft("Kiev 88 medium format", 3_300_000, 4)).await.unwrap();
  let app = test::init_service(App::new().app_data(Data::new(f.state.clone())).configure(configure_app_routes)).await;

  let mut holder = f.store.begin_purchase().await.unwrap();
  holder.lock_product(p.id).await.unwrap().unwrap();

  let req = test::TestRequest::post()
    .uri(&format!("/v1/product/{}/buy", p.id))
    .insert_header(("X-User-ID", f.buyer.to_string()))
    .set_json(json!({ "bankAccountId": f.bank, "paymentProofImageUrl": PROOF_URL, "quantity": 1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

  holder.rollback().await.unwrap();
  assert_eq!(f.store.find_product(p.id).await.unwrap().unwrap().stock, 4);
  assert!(f.store.payments().is_empty());
}
