use chatcore::dtos::MediaFile;
use chatcore::repositories::ReadAll;
use chatcore::{AppState, Config, ConversationController, Seed};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    config.print_info();

    let seed = Seed::load(&config)?;
    let state = Arc::new(AppState::new(config, seed));
    let controller = ConversationController::new(state.clone());

    // Stampa gli eventi come farebbe la UI
    let mut events = state.events.stream();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("event: {json}"),
                    Err(e) => warn!("Unable to serialize event: {}", e),
                },
                Err(e) => warn!("Event stream lagged: {}", e),
            }
        }
    });

    let me = state.user.get_current_user().await?;
    info!("Logged in as {}", me.display_name);
    controller.touch_presence(&me.id).await?;

    let chats = state.chat.get_all().await?;
    println!("{}", serde_json::to_string_pretty(&chats)?);

    let Some(first) = chats.first() else {
        info!("No chats in seed, nothing to do");
        return Ok(());
    };

    let view = controller.open_chat(&first.id).await?;
    let typing = controller.simulate_typing(&view.chat);
    let receipt = controller.mark_chat_read(&view.chat.id, &me.id).await?;
    info!("{} messages marked as read", receipt.messages_read);

    controller
        .send_message(&view.chat.id, &me.id, "Sounds great, see you later!")
        .await?;
    let reply = controller.simulate_incoming_reply(&view.chat);

    let photo = MediaFile {
        name: "beach.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        url: "https://picsum.photos/seed/beach/400/300".to_string(),
    };
    controller.send_media(&view.chat.id, &me.id, &photo).await?;

    if let Some(reply) = reply {
        match reply.await? {
            Ok(message) => info!("Got reply: {}", message.content),
            Err(e) => warn!("Simulated reply failed: {}", e),
        }
    }
    if let Some(typing) = typing {
        typing.await?;
    }

    // lascia il tempo alle consegne automatiche
    if let Some(delay) = state.config.delivery_delay {
        tokio::time::sleep(delay + Duration::from_millis(100)).await;
    }

    let view = controller.open_chat(&view.chat.id).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    let found = controller.search_chats(&me.id, "hiking").await?;
    info!("Search 'hiking' matched {} chats", found.len());

    Ok(())
}
