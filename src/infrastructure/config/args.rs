use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::entities::{MapRegion, PhotoId, PinId};

#[derive(Debug, Parser)]
#[command(
    name = "virtual-tourist",
    version,
    about = "Drop pins on the map and browse photos taken nearby",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Photo provider API key.
    #[arg(long, env = "FLICKR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Directory holding pins and cached images.
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Photos per album page.
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Ask the provider to filter unsafe content.
    #[arg(long)]
    pub safe_search: Option<bool>,

    /// Half-size of the search box in degrees.
    #[arg(long)]
    pub box_half_size: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drop a pin and download its first album.
    Drop {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// List stored pins.
    Pins,
    /// Show a pin's album, downloading missing images.
    Album { pin: PinId },
    /// Replace a pin's album with a new random page.
    Refresh { pin: PinId },
    /// Move a pin and reload its album.
    Move {
        pin: PinId,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Remove one photo from a pin's album.
    DeletePhoto { pin: PinId, photo: PhotoId },
    /// Remove a pin and its photos.
    DeletePin { pin: PinId },
    /// Show or set the remembered map region.
    Map {
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        #[arg(
            long,
            default_value_t = 10.0,
            allow_negative_numbers = true,
            value_parser = parse_span
        )]
        span: f64,
    },
    /// Show image cache usage.
    CacheStats,
    /// Delete every cached image.
    CacheClear,
}

fn parse_span(value: &str) -> Result<f64, String> {
    let span: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if MapRegion::is_valid_span(span) {
        Ok(span)
    } else {
        Err(format!(
            "span must be greater than 0 and at most {} degrees",
            MapRegion::MAX_SPAN
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_coordinates() {
        let args =
            CliArgs::parse_from(["virtual-tourist", "drop", "--lat", "-33.86", "--lon", "-70.6"]);
        match args.command {
            Command::Drop { lat, lon } => {
                assert!((lat + 33.86).abs() < f64::EPSILON);
                assert!((lon + 70.6).abs() < f64::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_delete_photo_args() {
        let pin = PinId::generate();
        let pin_arg = pin.to_string();
        let args = CliArgs::parse_from(["virtual-tourist", "delete-photo", &pin_arg, "5521"]);
        match args.command {
            Command::DeletePhoto { pin: parsed, photo } => {
                assert_eq!(parsed, pin);
                assert_eq!(photo.as_str(), "5521");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_map_span() {
        let args = CliArgs::parse_from([
            "virtual-tourist",
            "map",
            "--lat",
            "1",
            "--lon",
            "2",
            "--span",
            "4.5",
        ]);
        match args.command {
            Command::Map { span, .. } => assert!((span - 4.5).abs() < f64::EPSILON),
            other => panic!("unexpected command: {other:?}"),
        }

        for bad in ["-1", "0", "NaN", "inf", "400", "wide"] {
            assert!(
                CliArgs::try_parse_from(["virtual-tourist", "map", "--span", bad]).is_err(),
                "span {bad} accepted"
            );
        }
    }

    #[test]
    fn test_invalid_pin_id_rejected() {
        assert!(CliArgs::try_parse_from(["virtual-tourist", "album", "not-a-uuid"]).is_err());
    }
}
