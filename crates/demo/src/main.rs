use std::thread;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;

use eventbus_events::{Bus, BusConfig, Event};

fn handle_user_created(event: Event) {
    println!("Processing event: {}", event.data());
    // Simulate some processing.
    thread::sleep(Duration::from_millis(500));
    println!("Finished processing");
}

fn main() -> anyhow::Result<()> {
    eventbus_observability::init();

    let config = BusConfig::from_env().context("invalid event bus configuration")?;
    tracing::info!(?config, "starting event bus demo");

    let bus: Bus = Bus::with_config(config);
    bus.subscribe("user_created", handle_user_created);

    let event = Event::new(
        "user_created",
        "auth_service",
        json!({
            "user_id": "12345",
            "email": "user@example.com",
        }),
    );

    println!("Publishing event...");
    bus.publish("user_created", event);

    println!("All subscribers have finished processing");
    Ok(())
}
