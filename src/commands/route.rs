use crate::args::RouteArgs;
use crate::commands::Out;
use crate::geo::{self, AddressResolver, QueryOptions, RouteCache};
use crate::model::{Order, Stop};
use crate::{utils, Config, Mode, Result, Session};
use anyhow::{bail, Context};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, warn};

/// The drop-off sequence printed for one order.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub order_id: String,
    pub origin: Stop,
    pub stops: Vec<Stop>,
    /// Set when the stops could not be sorted and are shown in their original order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Sorts the drop-off stops of each order by distance from its pickup point.
///
/// A failure to sort one order does not fail the command: that order keeps its stops in their
/// original order and carries a note saying why.
pub async fn route(config: &Config, mode: Mode, args: &RouteArgs) -> Result<Out<Vec<RoutePlan>>> {
    let orders = load_orders(args).await?;
    let transport = Session::load(config).await?.transport(config).await?;
    let distances = geo::distance_service(mode);
    let resolver = args
        .label()
        .then(|| AddressResolver::new(geo::geocode_service(mode)));
    let options = QueryOptions::new(transport.timeout());
    let cache = RouteCache::new();

    let mut plans = Vec::with_capacity(orders.len());
    for order in &orders {
        let (stops, note) = match cache
            .sorted_stops(distances.as_ref(), &transport, order, &options)
            .await
        {
            Ok(sorted) => (sorted, None),
            Err(e) => {
                warn!("Unable to sort the stops of order {}: {e}", order.id);
                (order.stops.clone(), Some(format!("Not sorted: {e}")))
            }
        };
        let (origin, stops) = match &resolver {
            Some(resolver) => {
                let origin = resolver
                    .label_stops(&transport, std::slice::from_ref(&order.origin), &options)
                    .await
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| order.origin.clone());
                (origin, resolver.label_stops(&transport, &stops, &options).await)
            }
            None => (order.origin.clone(), stops),
        };
        plans.push(RoutePlan {
            order_id: order.id.clone(),
            origin,
            stops,
            note,
        });
    }

    Ok(Out::new(render(&plans), plans))
}

async fn load_orders(args: &RouteArgs) -> Result<Vec<Order>> {
    if let Some(path) = args.orders() {
        let orders: Vec<Order> = utils::deserialize(path)
            .await
            .with_context(|| format!("Unable to read orders from {}", path.display()))?;
        debug!("Loaded {} orders from {}", orders.len(), path.display());
        return Ok(orders);
    }
    let Some(origin) = args.origin() else {
        bail!("Give either --origin with one or more --stop, or --orders");
    };
    let origin = Stop::parse(origin).context("Invalid --origin")?;
    let stops = args
        .stops()
        .iter()
        .map(|s| Stop::parse(s).with_context(|| format!("Invalid --stop '{s}'")))
        .collect::<Result<Vec<_>>>()?;
    Ok(vec![Order {
        id: "cli".to_string(),
        origin,
        stops,
    }])
}

fn render(plans: &[RoutePlan]) -> String {
    let mut out = String::new();
    for plan in plans {
        let _ = writeln!(out, "Order {} from {}", plan.order_id, describe(&plan.origin));
        for (ix, stop) in plan.stops.iter().enumerate() {
            let _ = writeln!(out, "  {:>2}. {}", ix + 1, describe(stop));
        }
        if let Some(note) = &plan.note {
            let _ = writeln!(out, "  ({note})");
        }
    }
    out.trim_end().to_string()
}

fn describe(stop: &Stop) -> String {
    if stop.address().is_empty() {
        stop.coordinate().to_string()
    } else {
        format!("{} ({})", stop.address(), stop.coordinate())
    }
}
