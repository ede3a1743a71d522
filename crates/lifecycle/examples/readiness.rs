//! Readiness example - replaying CDP page events into a document

use lifecycle::{document_ready, CdpEvent, Document, DocumentLifecycle};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let document = Arc::new(Document::new());

    document_ready(&*document, || println!("DOM is ready"));

    // Log every notification
    let mut rx = document.subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = rx.recv().await {
            println!("{} ({})", notification.event, notification.ready_state);
        }
    });

    // What a browser would send over the wire for a navigation
    let feed = Arc::clone(&document);
    tokio::spawn(async move {
        let events = [
            r#"{"method":"Page.lifecycleEvent","params":{"frameId":"F1","loaderId":"L1","name":"init","timestamp":1.0}}"#,
            r#"{"method":"Page.lifecycleEvent","params":{"frameId":"F1","loaderId":"L1","name":"DOMContentLoaded","timestamp":1.2}}"#,
            r#"{"method":"Page.domContentEventFired","params":{"timestamp":1.2}}"#,
            r#"{"method":"Page.loadEventFired","params":{"timestamp":1.9}}"#,
        ];
        for raw in events {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            match CdpEvent::from_json(raw) {
                Ok(event) => {
                    feed.handle_cdp_event(&event);
                }
                Err(e) => eprintln!("Bad event: {}", e),
            }
        }
    });

    lifecycle::complete(&document).await?;
    println!("Page complete, readyState = {}", document.ready_state());

    Ok(())
}
