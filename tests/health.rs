mod common;

use axum::extract::State;
use storefront_api::routes::health::{health_check, health_report};

#[test]
fn report_is_degraded_without_database() {
    let report = health_report(false, true);
    assert_eq!(report.status, "degraded");
    assert!(!report.database);
    assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_check_reaches_the_database() -> anyhow::Result<()> {
    let Some((state, _mailer)) = common::setup_state().await? else {
        return Ok(());
    };
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert!(data.database);
    assert!(data.product_cache);
    Ok(())
}
