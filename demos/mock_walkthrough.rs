//! End-to-end walkthrough against the in-memory mock toolkit.
//!
//! Demonstrates:
//! - Booting the automation facade over a Toolkit implementation
//! - Navigation and bounded load waits
//! - Native element discovery and inspection
//! - Script execution with completion notification
//! - Page capture as PNG
//!
//! Usage:
//!   cargo run --example mock_walkthrough
//!   RUST_LOG=webview_automation=debug cargo run --example mock_walkthrough

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use webview_automation::toolkit::mock::{MockToolkit, ScriptBehavior};
use webview_automation::tree::query::Locator;
use webview_automation::{Automation, BrowserOptions, FramePath, Result};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("webview_automation=info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== Mock walkthrough ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let toolkit = MockToolkit::new();
    let window = toolkit.add_window("main");
    let form = window.add_widget(None, "Form", "login");
    let submit = window.add_widget(Some(&form), "PushButton", "submit");
    submit.set_text("Sign in");
    window
        .mock_main_frame()
        .set_script_behavior(ScriptBehavior::Fixed(serde_json::json!("Example Domain")));

    let (automation, view_id) =
        Automation::init(Arc::new(toolkit), BrowserOptions::new()).await?;
    println!("[Setup] view {view_id}, browser: {}\n", automation.browser_version());

    // ========================================================================
    // Navigation
    // ========================================================================

    println!("[1] Navigate...");
    automation
        .navigate_to_url(view_id, "https://example.com")
        .await?;
    automation.wait_for_all_views_to_stop_loading().await?;
    println!("    ✓ Loaded\n");

    // ========================================================================
    // Element discovery
    // ========================================================================

    println!("[2] Find the submit button...");
    let button = automation.find_native_element(view_id, Locator::XPath, "//PushButton")?;
    println!(
        "    ✓ {button}: text={:?} at {:?}\n",
        automation.get_native_element_text(view_id, &button)?,
        automation.get_native_element_location(view_id, &button)?,
    );

    // ========================================================================
    // Script execution
    // ========================================================================

    println!("[3] Run a script in the main frame...");
    let title = automation
        .execute_script(view_id, &FramePath::root(), "return document.title;", false)
        .await?;
    println!("    ✓ document.title = {title}\n");

    // ========================================================================
    // Capture
    // ========================================================================

    println!("[4] Capture the page...");
    let png = automation.capture_entire_page_as_png(view_id)?;
    println!("    ✓ {} PNG bytes\n", png.len());

    automation.terminate().await?;
    println!("Done.");
    Ok(())
}
