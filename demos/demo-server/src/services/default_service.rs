use kindling::prelude::*;
use kindling::ModuleCatalog;

#[service]
pub struct DefaultService;

impl DefaultService {
    pub fn render_welcome(&self) -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Kindling</title>
    <style>
        html, body { height: 100%; margin: 0; background: #f7fcfa; color: #333; }
        .container {
            display: flex;
            flex-direction: column;
            justify-content: center;
            align-items: center;
            height: 100vh;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
        }
        h1 { font-size: 3rem; color: #ff6b6b; }
        p { color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Welcome to Kindling</h1>
        <p>Get started by editing src/controllers/default_controller.rs</p>
    </div>
</body>
</html>"#
            .to_string()
    }
}

pub fn exports(catalog: ModuleCatalog) -> ModuleCatalog {
    catalog.module(file!(), |exports| {
        exports.class::<DefaultService>("DefaultService");
        Ok(())
    })
}
