use campus_desk::{
    config::{database, settings},
    core::{
        auth::{AuthUser, UserRole},
        cart::CartSession,
        consultation, directory, report,
        storage::FileStorage,
    },
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Configuration loaded.");

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the consultant directory
    directory::seed_consultants(&db, &app_config.consultants)
        .await
        .inspect_err(|e| error!("Failed to seed consultants: {}", e))?;

    // 6. Summarise what is stored
    let admin = AuthUser {
        id: "system".to_string(),
        role: UserRole::Admin,
        name: "System".to_string(),
        email: String::new(),
        phone: None,
    };
    let views = consultation::list_consultations_for_viewer(&db, Some(&admin)).await?;
    let counts = report::status_counts(&views);
    info!(
        "Consultations: {} total, {} pending, {} scheduled, {} completed, {} cancelled",
        counts.total, counts.pending, counts.scheduled, counts.completed, counts.cancelled
    );

    let consultants = directory::get_all_consultants(&db).await?;
    for revenue in report::consultant_revenue(
        &views,
        &consultants,
        app_config.reporting.default_hourly_rate,
    ) {
        info!(
            "Mentor {}: {} session(s), {:.1}h at {:.2}/h = {:.2}",
            revenue.mentor_id, revenue.sessions, revenue.hours, revenue.hourly_rate, revenue.revenue
        );
    }

    let storage = FileStorage::open(&app_config.storage.path)?;
    let cart = CartSession::load(storage);
    info!(
        "Local cart has {} item(s), wishlist has {}",
        cart.total_item_count(),
        cart.wishlist().len()
    );

    Ok(())
}
