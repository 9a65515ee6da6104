// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::app_state::AppState;
use newsdesk::bootstrap::{self, BootstrapResult};
use newsdesk::config::ValidatedConfig;
use newsdesk::iam::IdentityMiddlewareFactory;
use newsdesk::store::{Database, YamlDataStore};
use newsdesk::util;

const HELP_TEXT: &str = "Usage: newsdesk [-C <root>]\n\n  -C <root>    runtime directory holding config.yaml and the data file (default: .)\n  -h, --help   show this help\n";

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    let runtime_root = match parsed_args {
        ParsedArgs::Help => {
            print!("{}", HELP_TEXT);
            return 0;
        }
        ParsedArgs::Serve { runtime_root } => runtime_root,
    };

    let bootstrap = match bootstrap::bootstrap_runtime(&runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(run_server(bootstrap)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(bootstrap: BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);

    let logger = env_logger::Builder::from_default_env()
        .filter_level(validated_config.log_level_filter())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    util::init_logger(util::default_rules(), logger).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &bootstrap.root, &bootstrap.data_file);

    let store = YamlDataStore::new(bootstrap.data_file.clone())
        .map_err(|error| std::io::Error::other(error.to_string()))?;
    let database = match Database::open(Arc::new(store)) {
        Ok(database) => database,
        Err(error) => {
            eprintln!("❌ Failed to open data file: {}", error);
            eprintln!("❌ Application cannot start without its data.");
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    info!("✅ Data store initialized from {}", bootstrap.data_file.display());

    let app_state = Arc::new(AppState::new(database, &validated_config));
    info!(
        "✅ App state initialized with app name: {}",
        validated_config.app.name
    );

    let workers = validated_config.server.workers;
    let factory = {
        let config_for_app = validated_config.clone();
        let app_state_for_app = app_state.clone();

        move || {
            App::new()
                .app_data(web::Data::from(config_for_app.clone()))
                .app_data(web::Data::from(app_state_for_app.clone()))
                .wrap(IdentityMiddlewareFactory)
                .wrap(Logger::new(
                    r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
                ))
                .configure(newsdesk::configure)
        }
    };

    HttpServer::new(factory)
        .workers(workers)
        .bind(validated_config.server.address_tuple())?
        .run()
        .await
}

fn log_startup_info(config: &ValidatedConfig, root: &std::path::Path, data_file: &std::path::Path) {
    info!("Starting {} - {}", config.app.name, config.app.description);
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on http://{}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Sessions: cookie {}, idle timeout {} min, at most {}",
        config.session.cookie_name, config.session.idle_timeout_minutes, config.session.max_sessions
    );
    info!("Runtime root: {}", root.display());
    info!("Data file: {}", data_file.display());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

enum ParsedArgs {
    Serve { runtime_root: PathBuf },
    Help,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs::Help);
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument: {}", arg));
        }
    }

    Ok(ParsedArgs::Serve {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}
