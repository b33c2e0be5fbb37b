use planner_core::Site;

/// A site at an explicit coordinate with uniform service time.
pub fn site(id: &str, lat: f64, lon: f64, service_minutes: i64) -> Site {
    Site {
        id: id.to_string(),
        lat,
        lon,
        service_minutes: Some(service_minutes),
        cluster_id: None,
        name: None,
        street: None,
        city: None,
        state: None,
    }
}

/// Same as [`site`] but tagged with a cluster id.
pub fn clustered_site(id: &str, lat: f64, lon: f64, service_minutes: i64, cluster_id: u32) -> Site {
    Site {
        cluster_id: Some(cluster_id),
        ..site(id, lat, lon, service_minutes)
    }
}

/// Fifteen sites split between two state-sized clumps: Baton Rouge, LA and
/// Charlotte, NC. Used by the §8(a) boundary scenario — two crews, one route
/// per clump.
pub fn baton_rouge_and_charlotte(service_minutes: i64) -> Vec<Site> {
    let baton_rouge = (0..8).map(|i| {
        site(
            &format!("br-{i}"),
            30.45 + i as f64 * 0.01,
            -91.15 + i as f64 * 0.01,
            service_minutes,
        )
    });
    let charlotte = (0..7).map(|i| {
        site(
            &format!("clt-{i}"),
            35.23 + i as f64 * 0.01,
            -80.84 + i as f64 * 0.01,
            service_minutes,
        )
    });
    baton_rouge.chain(charlotte).collect()
}

/// `count` sites spread in a tight grid around a center point, never far
/// enough apart to force more than one cluster by themselves.
pub fn grid_around(count: usize, center_lat: f64, center_lon: f64, step_degrees: f64, service_minutes: i64) -> Vec<Site> {
    let side = (count as f64).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let row = (i / side) as f64;
            let col = (i % side) as f64;
            site(
                &format!("s-{i}"),
                center_lat + row * step_degrees,
                center_lon + col * step_degrees,
                service_minutes,
            )
        })
        .collect()
}

/// Sites sprawled widely across a whole state so no single route can
/// legally visit more than a couple of them under a tight budget.
pub fn sprawled_across_state(count: usize, service_minutes: i64) -> Vec<Site> {
    (0..count)
        .map(|i| {
            let angle = (i as f64) * 2.399963229728653;
            let radius = 3.0 * (i as f64 / count as f64).sqrt();
            site(
                &format!("sprawl-{i}"),
                32.0 + radius * angle.cos(),
                -95.0 + radius * angle.sin(),
                service_minutes,
            )
        })
        .collect()
}
