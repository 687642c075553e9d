use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::store::{AppointmentStore, MemoryAppointmentStore, SupabaseAppointmentStore};
use appointment_cell::BookingState;
use calendar_cell::services::gateway::{CalendarGateway, DisconnectedCalendar};
use calendar_cell::GoogleCalendarClient;
use doctor_cell::services::directory::{
    DoctorDirectory, MemoryDoctorDirectory, SupabaseDoctorDirectory,
};
use shared_config::AppConfig;
use shared_database::chat::{ChatLog, MemoryChatLog, SupabaseChatLog};
use shared_database::supabase::SupabaseClient;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Clinic Scheduler API server");

    // Load configuration
    let config = AppConfig::from_env();
    let calendar_timeout = Duration::from_secs(config.calendar_timeout_secs);

    // Storage-backed collaborators, with in-memory fallbacks for local runs
    let (directory, store, chat_log): (
        Arc<dyn DoctorDirectory>,
        Arc<dyn AppointmentStore>,
        Arc<dyn ChatLog>,
    ) = if config.is_configured() {
        let supabase = Arc::new(SupabaseClient::new(&config));
        (
            Arc::new(SupabaseDoctorDirectory::new(&config)),
            Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase))),
            Arc::new(SupabaseChatLog::new(supabase)),
        )
    } else {
        warn!("Database not configured - using in-memory storage with seed doctors");
        (
            Arc::new(MemoryDoctorDirectory::seeded()),
            Arc::new(MemoryAppointmentStore::new()),
            Arc::new(MemoryChatLog::new()),
        )
    };

    let calendar: Arc<dyn CalendarGateway> = match GoogleCalendarClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("Calendar gateway disabled ({}); availability will read as unknown", e);
            Arc::new(DisconnectedCalendar)
        }
    };

    let booking_state = Arc::new(BookingState::new(
        Arc::clone(&directory),
        store,
        calendar,
        chat_log,
        calendar_timeout,
    ));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(directory, booking_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
