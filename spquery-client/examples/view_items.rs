//! Lists the items a view selects.
//!
//! ```text
//! SPQUERY_SITE=https://contoso.sharepoint.com/sites/team \
//! SPQUERY_TOKEN=... \
//! cargo run --example view_items -- "Documents" "All Documents"
//! ```

use spquery_client::{logging, ClientConfig, ClientContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let list_title = args.next().unwrap_or_else(|| "Documents".to_string());
    let view_title = args.next().unwrap_or_else(|| "All Documents".to_string());

    let site = std::env::var("SPQUERY_SITE")?;
    let mut config = ClientConfig::new(site);
    if let Ok(token) = std::env::var("SPQUERY_TOKEN") {
        config = config.with_access_token(token);
    }
    logging::init_console_logging(&config)?;

    let ctx = ClientContext::connect(config)?;
    let view = ctx
        .web()
        .get_list_by_title(list_title)
        .views()?
        .get_by_title(view_title);

    let items = view.get_items().await?;
    ctx.execute_query().await?;

    for item in items.to_vec() {
        println!(
            "{:>6}  {}",
            item.id().map(|id| id.to_string()).unwrap_or_default(),
            item.title().unwrap_or_default()
        );
    }
    Ok(())
}
