use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use document_gateway::document::{Document, Product};
use document_gateway::{Gateway, GatewayConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn sample_document(n: usize) -> Document {
    let mut document = Document::new(format!("doc-{n}"))
        .with_participant("7700000000")
        .with_product(Product {
            certificate_document: Some("CONFORMITY_CERTIFICATE".to_string()),
            certificate_document_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            owner_inn: Some("7700000000".to_string()),
            producer_inn: Some("7700000000".to_string()),
            production_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            tnved_code: Some("6403".to_string()),
            uit_code: Some(format!("0104600000000{n:04}")),
            ..Product::default()
        });
    document.doc_status = Some("DRAFT".to_string());
    document.import_request = Some(false);
    document.production_date = NaiveDate::from_ymd_opt(2024, 3, 1);
    document.reg_date = NaiveDate::from_ymd_opt(2000, 1, 2);
    document
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,document_gateway=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2 requests per 200 ms.
    let config = GatewayConfig::for_time_unit(Duration::from_millis(1), 200, 2);
    let gateway = match Gateway::<Document>::new(config) {
        Ok(gateway) => Arc::new(gateway),
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    let producers: Vec<_> = (0..100)
        .map(|n| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                if let Err(err) = gateway.submit(sample_document(n), "sampleSignature") {
                    tracing::error!(error = %err, "submit failed");
                }
            })
        })
        .collect();

    for producer in producers {
        let _ = producer.await;
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    gateway.shutdown().await;
    println!("{:?}", gateway.stats());
}
