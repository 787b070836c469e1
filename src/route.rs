//! The last plotted multi-jump route, progress marking, and
//! remaining-distance reporting.

use crate::journal::events::NavRouteEvent;
use crate::model::{RouteItem, SystemAddress};

fn distance_ly(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Rebuilds the route from a `NavRoute` event, computing each entry's
/// distance from the previous entry's star position (the first entry's
/// distance is 0, matching the reference's "distance from previous").
pub fn build_route(event: &NavRouteEvent) -> Vec<RouteItem> {
    let mut items = Vec::with_capacity(event.route.len());
    let mut previous_pos: Option<[f64; 3]> = None;

    for entry in &event.route {
        let distance = previous_pos.map_or(0.0, |prev| distance_ly(prev, entry.star_pos));
        items.push(RouteItem {
            system_name: entry.star_system.clone(),
            system_address: entry.system_address,
            star_pos: entry.star_pos,
            star_class: entry.star_class.clone(),
            distance_ly: distance,
            visited: false,
        });
        previous_pos = Some(entry.star_pos);
    }

    items
}

/// Marks the entry matching `system_address` and every entry before it as
/// visited.
pub fn mark_visited_through(route: &mut [RouteItem], system_address: SystemAddress) {
    if let Some(idx) = route.iter().position(|item| item.system_address == system_address) {
        for item in route.iter_mut().take(idx + 1) {
            item.visited = true;
        }
    }
}

pub fn remaining(route: &[RouteItem]) -> usize {
    route.iter().filter(|item| !item.visited).count()
}

pub fn next(route: &[RouteItem]) -> Option<&RouteItem> {
    route.iter().find(|item| !item.visited)
}

pub fn total_remaining_ly(route: &[RouteItem]) -> f64 {
    route.iter().filter(|item| !item.visited).map(|item| item.distance_ly).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::events::NavRouteItemEvent;

    fn route_item(name: &str, address: u64, x: f64) -> NavRouteItemEvent {
        NavRouteItemEvent {
            star_system: name.to_string(),
            system_address: address,
            star_pos: [x, 0.0, 0.0],
            star_class: "K".to_string(),
        }
    }

    #[test]
    fn distance_computed_from_previous_star_pos() {
        let event = NavRouteEvent {
            route: vec![route_item("A", 1, 0.0), route_item("B", 2, 10.0), route_item("C", 3, 30.0)],
        };
        let route = build_route(&event);
        assert_eq!(route[0].distance_ly, 0.0);
        assert_eq!(route[1].distance_ly, 10.0);
        assert_eq!(route[2].distance_ly, 20.0);
    }

    #[test]
    fn visited_marking_and_remaining() {
        let mut route = vec![
            RouteItem { system_name: "A".into(), system_address: 1, star_pos: [0.0; 3], star_class: "K".into(), distance_ly: 10.0, visited: false },
            RouteItem { system_name: "B".into(), system_address: 2, star_pos: [0.0; 3], star_class: "K".into(), distance_ly: 20.0, visited: false },
            RouteItem { system_name: "C".into(), system_address: 3, star_pos: [0.0; 3], star_class: "K".into(), distance_ly: 10.0, visited: false },
        ];

        mark_visited_through(&mut route, 2);
        assert!(route[0].visited && route[1].visited);
        assert!(!route[2].visited);
        assert_eq!(remaining(&route), 1);
        assert_eq!(next(&route).unwrap().system_name, "C");
        assert_eq!(total_remaining_ly(&route), 10.0);
    }
}
