pub mod books;
pub mod users;

use std::sync::Arc;

use shelf_authz::Authenticator;
use shelf_db::JoinTable;
use shelf_kernel::{settings::Settings, ModuleRegistry, Store};

use books::{models::Book, store::BookStore};
use users::store::UserStore;

/// Register all project-specific modules with the registry
///
/// Both modules share one holdings table; users own it, books read it.
pub fn register_all(
    registry: &mut ModuleRegistry,
    settings: &Settings,
    authenticator: Arc<dyn Authenticator>,
) {
    let holdings = Arc::new(JoinTable::new());
    let book_store = Arc::new(BookStore::new(
        settings.store.sequence_start,
        holdings.clone(),
    ));
    let user_store = Arc::new(UserStore::new(
        settings.store.sequence_start,
        book_store.clone() as Arc<dyn Store<Book>>,
        holdings,
    ));

    registry.register(books::create_module(book_store));
    registry.register(users::create_module(
        user_store,
        authenticator,
        settings.catalog.match_books_by,
    ));
}
