use bazaar::filter::ListingQuery;
use bazaar::{
  BuyRequest, CatalogService, FilterSpec, MemoryMarketStore, ProductCondition, ProductDraft, PurchaseEngine,
  SortDirection, SortKey,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn draft(i: usize, stock: i64) -> ProductDraft {
  ProductDraft {
    name: format!("Bench product {:05}", i),
    price: (i as i64 % 500) * 1_000,
    image_url: "https://img.example.com/bench.jpg".into(),
    stock,
    condition: if i % 3 == 0 { ProductCondition::Second } else { ProductCondition::New },
    tags: match i % 4 {
      0 => vec!["a".into(), "b".into()],
      1 => vec!["a".into()],
      2 => vec!["b".into(), "c".into()],
      _ => vec!["d".into()],
    },
    is_purchasable: true,
  }
}

fn full_spec() -> FilterSpec {
  FilterSpec {
    user_only: true,
    tags: vec!["a".into(), "b".into()],
    condition: Some(ProductCondition::New),
    show_empty_stock: false,
    min_price: Some(10_000),
    max_price: Some(400_000),
    search: Some("product 0".into()),
    sort_by: Some(SortKey::Price),
    order_by: SortDirection::Desc,
    limit: Some(20),
    offset: Some(40),
  }
}

fn bench_buy(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let store = Arc::new(MemoryMarketStore::new());
  let seller = store.add_user("bench", "Bench Seller");
  let bank = store.add_bank_account(seller.id, "BCA", "Bench Seller", "0000000001");
  let catalog = CatalogService::new(store.clone(), store.clone());
  let product = rt
    .block_on(catalog.create_product(seller.id, draft(0, i64::MAX / 2)))
    .unwrap();
  let engine = PurchaseEngine::new(store.clone(), store.clone());

  let mut group = c.benchmark_group("PurchaseEngine");
  group.throughput(Throughput::Elements(1));
  group.bench_function("buy_memory_store", |b| {
    b.to_async(&rt).iter(|| {
      engine.buy(BuyRequest {
        product_id: product.id,
        bank_account_id: bank.id,
        quantity: 1,
        payment_proof_image_url: "https://proof.example.com/p.jpg".into(),
        buyer_id: None,
      })
    })
  });
  group.finish();
}

fn bench_compile(c: &mut Criterion) {
  let spec = full_spec();
  let mut group = c.benchmark_group("FilterCompiler");
  group.bench_function("compile", |b| b.iter(|| ListingQuery::compile(&spec, Some(1))));
  group.bench_function("compile_and_render", |b| {
    b.iter(|| {
      let q = ListingQuery::compile(&spec, Some(1));
      let fetch = q.fetch_sql();
      let count = q.count_sql();
      fetch.sql().len() + count.sql().len()
    })
  });
  group.finish();
}

fn bench_listing(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let mut group = c.benchmark_group("MemoryListing");

  for size in [100usize, 1_000] {
    let store = Arc::new(MemoryMarketStore::new());
    let seller = store.add_user("bench", "Bench Seller");
    let catalog = CatalogService::new(store.clone(), store.clone());
    rt.block_on(async {
      for i in 0..size {
        catalog.create_product(seller.id, draft(i, (i % 5) as i64)).await.unwrap();
      }
    });
    let spec = FilterSpec {
      sort_by: Some(SortKey::Price),
      limit: Some(20),
      ..Default::default()
    };

    group.throughput(Throughput::Elements(size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &spec, |b, spec| {
      b.to_async(&rt).iter(|| catalog.list_products(spec, None))
    });
  }
  group.finish();
}

criterion_group!(benches, bench_buy, bench_compile, bench_listing);
criterion_main!(benches);
