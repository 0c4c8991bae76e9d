use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use led_driver_calculator::client::HttpBackend;
use led_driver_calculator::i18n::{self, Translator};
use led_driver_calculator::store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use led_driver_calculator::{app, config};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "LED strip driver calculator (CLI)")]
struct Cli {
    /// 언어 코드 (auto/en/hi)
    #[arg(long, short = 'L', default_value = "auto")]
    lang: String,
    /// 계산 서비스 주소. 설정 파일 값을 덮어쓴다.
    #[arg(long)]
    server: Option<String>,
    /// 저장 목록 디렉터리
    #[arg(long)]
    storage_dir: Option<PathBuf>,
    /// 저장 목록을 디스크에 쓰지 않는다.
    #[arg(long)]
    no_persist: bool,
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,
}

/// 프로그램의 엔트리 포인트. 설정을 로드한 뒤 CLI 애플리케이션을 실행한다.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    if let Err(err) = try_run(Cli::parse()) {
        eprintln!("오류: {err}");
        std::process::exit(1);
    }
}

fn try_run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::load_or_default_at(&cli.config)?;
    if let Some(server) = &cli.server {
        cfg.server_url = server.clone();
    }
    if let Some(dir) = &cli.storage_dir {
        cfg.storage_dir = Some(dir.clone());
    }
    let lang = i18n::resolve_language(&cli.lang, Some(&cfg.language));
    let translator = Translator::new_with_pack(lang, cfg.language_pack_dir.as_deref());

    let backend = HttpBackend::new(&cfg.server_url, cfg.request_timeout())?;
    let store: Box<dyn KeyValueStore> = if cli.no_persist {
        Box::new(MemoryKeyValueStore::new())
    } else {
        Box::new(FileKeyValueStore::new(cfg.storage_path()))
    };
    tracing::info!(server = backend.base_url(), language = lang.as_code(), "starting cli");

    let mut calc = app::Calculator::new(
        Arc::new(backend.clone()),
        backend,
        store,
        translator,
        cfg.language_pack_dir.clone(),
    );
    app::run(&mut cfg, &cli.config, &mut calc)?;
    Ok(())
}
