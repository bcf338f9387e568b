use crate::commands::Out;
use crate::geo::{self, AddressResolver, QueryOptions};
use crate::model::Coordinate;
use crate::{Config, Mode, Result, Session};
use anyhow::Context;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
pub struct GeocodeLine {
    pub coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Looks up the address of each of `coordinates`. A coordinate that cannot be resolved is
/// reported inline; only unparseable input fails the command.
pub async fn geocode(
    config: &Config,
    mode: Mode,
    coordinates: &[String],
) -> Result<Out<Vec<GeocodeLine>>> {
    let coordinates = coordinates
        .iter()
        .map(|s| Coordinate::from_str(s).with_context(|| format!("Invalid coordinate '{s}'")))
        .collect::<Result<Vec<_>>>()?;
    let transport = Session::load(config).await?.transport(config).await?;
    let resolver = AddressResolver::new(geo::geocode_service(mode));
    let options = QueryOptions::new(transport.timeout());

    let mut lines = Vec::with_capacity(coordinates.len());
    for coordinate in coordinates {
        let line = match resolver.resolve_address(&transport, coordinate, &options).await {
            Ok(address) => GeocodeLine {
                coordinate,
                address: Some(address),
                error: None,
            },
            Err(e) => GeocodeLine {
                coordinate,
                address: None,
                error: Some(e.to_string()),
            },
        };
        lines.push(line);
    }

    let message = lines
        .iter()
        .map(|line| match (&line.address, &line.error) {
            (Some(address), _) => format!("{}: {address}", line.coordinate),
            (None, Some(error)) => format!("{}: ({error})", line.coordinate),
            (None, None) => line.coordinate.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(message, lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_geocode_in_test_mode() {
        let env = TestEnv::new().await;
        let out = geocode(
            &env.config(),
            Mode::Test,
            &["13.6900,100.7501".to_string(), "1,1".to_string()],
        )
        .await
        .unwrap();
        let lines = out.structure().unwrap();
        assert!(lines[0]
            .address
            .as_deref()
            .unwrap()
            .starts_with("Suvarnabhumi Airport"));
        assert!(lines[1].address.is_none());
        assert!(lines[1].error.is_some());
    }

    #[tokio::test]
    async fn test_geocode_rejects_bad_input() {
        let env = TestEnv::new().await;
        let result = geocode(&env.config(), Mode::Test, &["north pole".to_string()]).await;
        assert!(result.is_err());
    }
}
