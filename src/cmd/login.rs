use anyhow::Result;

use dafilms::{FilmService, SiteClient};

pub async fn cmd_login(service: &mut FilmService<SiteClient>) -> Result<()> {
    let user = service
        .settings()
        .username
        .clone()
        .unwrap_or_default();
    service.login().await?;
    println!("✅ Logged in as {user}");
    Ok(())
}
