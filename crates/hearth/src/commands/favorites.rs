//! `hearth toggle` / `hearth reorder`: favorite commands, printed once the
//! favorites feed reflects them.

use hearth_core::EntityId;
use hearth_core::features::{FavoritesEvent, FavoritesStore};

use super::entities;
use crate::cli::{ReorderArgs, ToggleArgs};
use crate::error::CliError;
use crate::session::Session;

async fn loaded_store(session: &Session) -> Result<FavoritesStore, CliError> {
    let mut store = FavoritesStore::from_service(&session.service);
    store.send(FavoritesEvent::Appeared);
    session.settle(&mut store, "favorites", |s| s.loaded).await?;
    Ok(store)
}

pub async fn toggle(session: &Session, args: ToggleArgs) -> Result<(), CliError> {
    let record = session.require_record(&args.id)?;
    let mut store = loaded_store(session).await?;

    let id = record.id.clone();
    let was_favorite = store.state().position(&id).is_some();
    store.send(FavoritesEvent::ToggleFavorite(id.clone()));
    session
        .settle(&mut store, "favorite toggle", |s| {
            s.position(&id).is_some() != was_favorite
        })
        .await?;

    if was_favorite {
        session.note(&format!("Removed '{}' from favorites", record.name));
    } else {
        session.note(&format!("Added '{}' to favorites", record.name));
    }
    session.print(&entities::render(session, &store.state().favorites)?);
    Ok(())
}

pub async fn reorder(session: &Session, args: ReorderArgs) -> Result<(), CliError> {
    let mut store = loaded_store(session).await?;
    let source = favorite_id(session, &store, &args.source)?;
    let target = favorite_id(session, &store, &args.target)?;
    let Some(index) = store.state().position(&target) else {
        return Err(not_a_favorite(&args.target));
    };

    if source != target {
        store.send(FavoritesEvent::Reorder {
            source: source.clone(),
            target,
        });
        session
            .settle(&mut store, "favorite reorder", |s| s.position(&source) == Some(index))
            .await?;
        session.note(&format!("Moved '{}' to position {}", args.source, index + 1));
    }
    session.print(&entities::render(session, &store.state().favorites)?);
    Ok(())
}

/// Resolve `identifier` to the id of a current favorite.
fn favorite_id(
    session: &Session,
    store: &FavoritesStore,
    identifier: &str,
) -> Result<EntityId, CliError> {
    let id = session.require_record(identifier)?.id;
    if store.state().position(&id).is_none() {
        return Err(not_a_favorite(identifier));
    }
    Ok(id)
}

fn not_a_favorite(identifier: &str) -> CliError {
    CliError::NotFound {
        resource_type: "favorite".into(),
        identifier: identifier.into(),
        list_command: "list favorites".into(),
    }
}
