//! `hearth list`: converged collection or favorites snapshot.

use std::sync::Arc;

use hearth_core::features::{CollectionEvent, CollectionStore, FavoritesEvent, FavoritesStore};
use hearth_core::{EntityKind, Snapshot};

use super::entities;
use crate::cli::{ListArgs, ListTarget};
use crate::error::CliError;
use crate::session::Session;

pub async fn handle(session: &Session, args: ListArgs) -> Result<(), CliError> {
    let records = match args.target {
        ListTarget::Devices => collection(session, EntityKind::Device).await?,
        ListTarget::Groups => collection(session, EntityKind::Group).await?,
        ListTarget::Scenes => collection(session, EntityKind::Scene).await?,
        ListTarget::Favorites => favorites(session).await?,
    };
    session.print(&entities::render(session, &records)?);
    Ok(())
}

async fn collection(session: &Session, kind: EntityKind) -> Result<Snapshot, CliError> {
    let mut store = CollectionStore::for_kind(kind, &session.service);
    store.send(CollectionEvent::Appeared);
    session.settle(&mut store, "collection", |s| s.loaded).await?;
    Ok(Arc::clone(&store.state().entities))
}

async fn favorites(session: &Session) -> Result<Snapshot, CliError> {
    let mut store = FavoritesStore::from_service(&session.service);
    store.send(FavoritesEvent::Appeared);
    session.settle(&mut store, "favorites", |s| s.loaded).await?;
    Ok(Arc::clone(&store.state().favorites))
}
