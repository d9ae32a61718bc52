use crate::api::ApiClient;
use crate::auth::expiry::spawn_expiry_watcher;
use crate::auth::session::AuthSession;
use crate::auth::store::TokenStore;
use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::services::{CatalogService, OrdersService};
use anyhow::{anyhow, Result};
use tracing::info;

/// Handle the action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let store = TokenStore::open(globals.auth_store.clone());
    let (client, mut events) = ApiClient::new(&globals.api_url, store)?;
    let session = AuthSession::new(client.clone());

    match action {
        Action::Login { username, password } => {
            let credentials = session.login(&username, &password).await?;
            match credentials.user {
                Some(user) => println!("logged in as {}", user.username),
                None => println!("logged in"),
            }
        }

        Action::Logout => {
            session.logout().await?;
            println!("logged out");
        }

        Action::Whoami => {
            let user = session.me().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }

        Action::Introspect { token } => {
            let token = match token {
                Some(token) => token,
                None => client
                    .store()
                    .access_token()
                    .ok_or_else(|| anyhow!("no stored access token, log in first"))?,
            };
            let valid = session.introspect(&token).await?;
            println!("{}", if valid { "valid" } else { "invalid" });
        }

        Action::Products { id, search } => {
            let catalog = CatalogService::new(client);
            match (id, search) {
                (Some(id), _) => {
                    let product = catalog.get(id).await?;
                    println!("{}", serde_json::to_string_pretty(&product)?);
                }
                (None, Some(keyword)) => {
                    let products = catalog.search(&keyword).await?;
                    println!("{}", serde_json::to_string_pretty(&products)?);
                }
                (None, None) => {
                    let products = catalog.list().await?;
                    println!("{}", serde_json::to_string_pretty(&products)?);
                }
            }
        }

        Action::Orders { id, customer } => {
            let orders = OrdersService::new(client);
            match (id, customer) {
                (Some(id), _) => {
                    let order = orders.get(id).await?;
                    println!("{}", serde_json::to_string_pretty(&order)?);
                }
                (None, Some(customer)) => {
                    let list = orders.list_for_customer(&customer).await?;
                    println!("{}", serde_json::to_string_pretty(&list)?);
                }
                (None, None) => {
                    return Err(anyhow!("pass --customer <ID> or --id <ID>"));
                }
            }
        }

        Action::Session => {
            if !client.store().is_authenticated() {
                return Err(anyhow!("no stored session, log in first"));
            }

            let watcher = spawn_expiry_watcher(client);
            info!("session watcher running, Ctrl-C to stop");

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("stopping");
                }
                event = events.recv() => {
                    if event.is_some() {
                        return Err(anyhow!("session expired, log in again"));
                    }
                }
            }

            watcher.abort();
        }
    }

    Ok(())
}
