use anyhow::Result;

use dafilms::{FilmService, ListingSort, SiteClient};

use super::output::Output;

/// Listing selected on the command line.
#[derive(Debug, Clone, Copy)]
pub enum Listing {
    Sorted(ListingSort),
    Subscription,
    Purchased,
}

pub async fn cmd_list(
    service: &mut FilmService<SiteClient>,
    listing: Listing,
    limit: Option<usize>,
    out: Output,
) -> Result<()> {
    let films = match listing {
        Listing::Sorted(sort) => service.list(sort, limit).await?,
        Listing::Subscription => service.subscription(limit).await?,
        Listing::Purchased => {
            let mut films = service.purchased().await?;
            if let Some(limit) = limit {
                films.truncate(limit);
            }
            films
        }
    };
    out.films(&films)
}

pub async fn cmd_search(
    service: &mut FilmService<SiteClient>,
    query: &str,
    limit: Option<usize>,
    out: Output,
) -> Result<()> {
    let films = service.search(query, limit).await?;
    out.films(&films)
}

pub async fn cmd_details(service: &mut FilmService<SiteClient>, film_id: &str, out: Output) -> Result<()> {
    let details = service.details(film_id).await?;
    out.details(&details)
}
