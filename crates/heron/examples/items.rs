//! A small item store.
//!
//! ```text
//! cargo run -p heron --example items
//! curl -X POST localhost:8080/items -d '{"name":"lamp","price_cents":1999}'
//! curl localhost:8080/items/1
//! ```

use std::sync::Mutex;

use heron::prelude::*;
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
    price_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: i64,
    name: String,
    price_cents: i64,
}

#[derive(Default)]
struct ItemController {
    items: Mutex<Vec<Item>>,
}

#[controller(path = "/items", scan, crate = "heron::core")]
impl ItemController {
    #[get]
    fn count(&self) -> HandlerResult<usize> {
        Ok(self.lock()?.len())
    }

    #[get("/{id}")]
    fn show(&self, #[path_variable] id: i64) -> HandlerResult<ResponseEntity<Item>> {
        let items = self.lock()?;
        Ok(match items.iter().find(|item| item.id == id) {
            Some(item) => ResponseEntity::ok(item.clone()),
            None => ResponseEntity::empty(StatusCode::NOT_FOUND),
        })
    }

    #[post]
    fn create(&self, #[request_body] new: NewItem) -> HandlerResult<ResponseEntity<Item>> {
        let mut items = self.lock()?;
        let item = Item {
            id: i64::try_from(items.len()).map_err(|e| HandlerError::with_source("too many items", e))?
                + 1,
            name: new.name,
            price_cents: new.price_cents,
        };
        items.push(item.clone());
        Ok(ResponseEntity::created(item))
    }

    #[delete("/{id}")]
    fn remove(&self, #[path_variable] id: i64) -> HandlerResult<ResponseEntity<()>> {
        self.lock()?.retain(|item| item.id != id);
        Ok(ResponseEntity::no_content())
    }

    fn lock(&self) -> HandlerResult<std::sync::MutexGuard<'_, Vec<Item>>> {
        self.items
            .lock()
            .map_err(|_| HandlerError::new("item store poisoned"))
    }
}

#[tokio::main]
async fn main() -> Result<(), BootError> {
    Application::from_env()?
        .discover(&LinkedComponents)
        .run()
        .await
}
