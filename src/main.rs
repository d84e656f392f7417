use rinpaint::{
    logger::{self, LoggerConfig},
    Config, EditSession, GeminiClient, Point, SelectedFile,
};
use std::env;
use std::fs;
use std::path::Path;

fn usage() -> String {
    "usage: rinpaint <image> <prompt> <x,y> [<x,y> ...]".to_string()
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {:?}", value))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("{}: {}", value, e))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("{}: {}", value, e))?;
    let point = Point::new(x, y);
    if !point.is_finite() {
        return Err(format!("{}: coordinates must be finite", value));
    }
    Ok(point)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(LoggerConfig::from_env())?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        return Err(usage().into());
    }
    let image_path = Path::new(&args[0]);
    let prompt = &args[1];
    let points = args[2..]
        .iter()
        .map(|arg| parse_point(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let config = Config::from_env();
    logger::log_config_info(&config);

    let gemini_config = config.gemini.clone().unwrap_or_default();
    let client = match GeminiClient::new(gemini_config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Failed to initialize Gemini client: {}", e);
            return Err(e.into());
        }
    };

    let mut session = EditSession::new(client, &config);

    let mime_type = image::ImageFormat::from_path(image_path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string());
    let name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    session.select_image(SelectedFile::new(name, mime_type, fs::read(image_path)?))?;

    let mut points = points.into_iter();
    if let Some(first) = points.next() {
        session.begin_stroke(first);
        session.extend_stroke(first);
        for point in points {
            session.extend_stroke(point);
        }
        session.end_stroke();
    }
    session.set_prompt(prompt.as_str());

    let edited = session.submit().await?;
    let filename = format!(
        "edited_{}.{}",
        chrono::Utc::now().timestamp(),
        edited.extension()
    );
    fs::write(&filename, &edited.bytes)?;
    log::info!("💾 Edited image saved to: {}", filename);

    Ok(())
}
