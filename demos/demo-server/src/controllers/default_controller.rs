use crate::services::DefaultService;
use axum::response::Html;
use kindling::prelude::*;
use kindling::ModuleCatalog;

#[controller]
pub struct DefaultController {
    default_service: Arc<DefaultService>,
}

#[routes]
impl DefaultController {
    #[get]
    pub async fn index(&self) -> Html<String> {
        Html(self.default_service.render_welcome())
    }
}

pub fn exports(catalog: ModuleCatalog) -> ModuleCatalog {
    catalog.module(file!(), |exports| {
        exports.class::<DefaultController>("DefaultController");
        Ok(())
    })
}
