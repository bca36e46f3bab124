//! Every source file that declares components registers its exports here.

use kindling::ModuleCatalog;

pub fn modules() -> ModuleCatalog {
    let catalog = ModuleCatalog::new();
    let catalog = crate::controllers::default_controller::exports(catalog);
    let catalog = crate::controllers::user_controller::exports(catalog);
    let catalog = crate::services::default_service::exports(catalog);
    crate::repository::user_repository::exports(catalog)
}
