use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};
mod config;
mod error;
mod model;
mod services;
mod utils;

use config::Config;
use model::RuleSet;
use services::{create_backend, ConfigWatcher, SchedulerSettings, UpdateCycleScheduler};

#[derive(Parser, Debug)]
#[command(name = "border-tint")]
#[command(about = "Раскраска рамок окон по правилам процессов с анимациями")]
struct Args {
    /// Путь к файлу конфигурации (JSON или TOML)
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Режим сухого запуска (имитация окон, цвета только логируются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования; по умолчанию берётся из конфигурации
    #[arg(long)]
    log_level: Option<String>,

    /// Не отслеживать изменения файла конфигурации
    #[arg(long)]
    no_watch: bool,

    /// Показать цвет правила (номер или имя процесса) и выйти
    #[arg(long, value_name = "RULE")]
    preview: Option<String>,

    /// Для --preview: окно в фокусе
    #[arg(long, requires = "preview")]
    focused: bool,

    /// Для --preview: момент времени в секундах
    #[arg(long, value_name = "SECONDS", requires = "preview")]
    at: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации; до её чтения логи идут через временный подписчик
    let bootstrap_level = args.log_level.as_deref().unwrap_or("info");
    let config = load_config(&args.config, bootstrap_level, std::io::stdout)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск border-tint v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    let rules = config.rule_set()?;
    for line in rules.describe() {
        info!("  {}", line);
    }

    if let Some(target) = args.preview.as_deref() {
        return preview(&rules, target, args.focused, args.at.unwrap_or(0.0));
    }

    if args.dry_run {
        warn!("Режим сухого запуска - цвета рамок не применяются");
    }

    let backend = create_backend(args.dry_run)?;
    let scheduler = Arc::new(UpdateCycleScheduler::new(
        backend,
        rules,
        SchedulerSettings::from(&config.service),
    ));

    if config.service_enabled {
        scheduler.enable();
    } else {
        info!("Сервис выключен в конфигурации (service_enabled = false)");
    }

    let _watcher = if args.no_watch {
        None
    } else {
        match ConfigWatcher::start(PathBuf::from(&args.config), scheduler.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Горячая перезагрузка конфигурации недоступна: {}", e);
                None
            }
        }
    };

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");
    scheduler.disable();

    info!(
        "border-tint завершил работу (циклов: {}, окон с рамкой: {})",
        scheduler.cycles(),
        scheduler.tracked_windows()
    );
    Ok(())
}

/// Печатает цвет правила в заданный момент без запуска сервиса
fn preview(rules: &RuleSet, target: &str, focused: bool, at: f64) -> Result<()> {
    let index = match target.parse::<usize>() {
        Ok(number) if number >= 1 => number - 1,
        Ok(_) => anyhow::bail!("Номера правил начинаются с 1"),
        Err(_) => match rules.find_process_rule(target) {
            Some(index) => index,
            None => anyhow::bail!("Правило для процесса '{}' не найдено", target),
        },
    };

    let Some(rule) = rules.get(index) else {
        anyhow::bail!("Правило #{} не найдено (всего правил: {})", index + 1, rules.len());
    };

    let color = UpdateCycleScheduler::preview_color(rule, focused, at);
    println!("{}. {}", index + 1, rule);
    println!(
        "{} @ {:.2}s -> {}",
        if focused { "active" } else { "inactive" },
        at,
        color
    );

    Ok(())
}

/// Загружает конфигурацию под временным подписчиком: уровень и формат
/// основного логирования известны только после чтения файла
fn load_config<W>(path: &str, level: &str, writer: W) -> Result<Config>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::try_new(level)?)
        .with_writer(writer)
        .finish();

    tracing::subscriber::with_default(bootstrap, || Config::load(path))
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "full" {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
