#![allow(clippy::module_inception)]

#![warn(clippy::imprecise_flops)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::cognitive_complexity)]
#![warn(clippy::implicit_saturating_sub)]
#![warn(clippy::manual_ok_or)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::trivially_copy_pass_by_ref)]
#![warn(clippy::unreadable_literal)]
#![warn(clippy::unused_self)]

use actix_web::{web, App, HttpServer};
use actix_web::middleware::Logger;
use std::env;
#[cfg(feature="ssl-secure")]
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use sqlx::PgPool;

mod game;
mod lib;
mod store;

use game::{
    game as g,
    system,
    turn,
    turn::{order, snapshot},
    user,
};
use store::GameStores;

/// Global state shared by every handler: the admin pool and the per-game store manager.
pub struct AppState {
    pub db_pool: PgPool,
    pub stores: GameStores,
}

/// Development-only operations (express start, force resolve) are gated on this flag.
pub fn is_dev_mode() -> bool {
    get_env("DEV_MODE", "0") == "1"
}

fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
        .service(user::register)
        .service(user::login)
        .service(user::get_current_user)
    )
    .service(
        web::scope("/games")
        .service(g::create_game)
        .service(g::list_games)
        .service(g::express_start)
        .service(g::join_game)
        .service(g::generate_game_map)
        .service(g::force_resolve)
        .service(system::get_map)
        .service(turn::submit_turn)
        .service(turn::get_turn_status)
        .service(order::create_order)
        .service(order::get_orders)
        .service(order::delete_order)
        .service(snapshot::get_snapshot)
        .service(g::get_game)
        .service(g::delete_game)
    );
}

fn get_env(key: &str, default: &str) -> String {
    match env::var_os(key) {
        Some(val) => val.into_string().unwrap(),
        None => String::from(default)
    }
}

fn base_url() -> String {
    format!(
        "postgres://{}:{}@{}",
        &get_env("POSTGRES_USER", "nebula"),
        &get_env("POSTGRES_PASSWORD", "nebula"),
        &get_env("POSTGRES_HOST", "localhost")
    )
}

async fn generate_state() -> AppState {
    let base = base_url();
    let db_pool = store::init_admin_pool(&base, &get_env("ADMIN_DB", "nebula_admin")).await
        .expect("Could not initialize the admin database");
    AppState {
        db_pool,
        stores: GameStores::new(base),
    }
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info,actix_web=info");
    }
    env_logger::init();

    let state = web::Data::new(generate_state().await);

    let mut server = HttpServer::new(move || App::new()
        .wrap(Logger::default())
        .app_data(state.clone()).configure(config));

    #[cfg(feature="ssl-secure")]
    {
        let key = get_env("SSL_PRIVATE_KEY", "../var/ssl/key.pem");
        let cert = get_env("SSL_CERTIFICATE", "../var/ssl/cert.pem");

        let mut ssl_config = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
        ssl_config.set_private_key_file(key, SslFiletype::PEM).unwrap();
        ssl_config.set_certificate_chain_file(cert).unwrap();

        server = server.bind_openssl(get_env("LISTENING_URL", "127.0.0.1:443"), ssl_config)?;
    }
    #[cfg(not(feature="ssl-secure"))]
    {
        server = server.bind(get_env("LISTENING_URL", "127.0.0.1:8080"))?;
    }
    server.run().await
}
