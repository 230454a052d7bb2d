//! Shared SKU and plan builders for integration tests

#![allow(dead_code)]

use tfcost::billing::{Category, Sku, TierRate};

pub const US_REGIONS: &[&str] = &["us-central1", "us-east1", "us-west1"];

pub fn compute_sku(description: &str, group: &str, usage_type: &str, unit: &str, nanos: i64) -> Sku {
    Sku::new(
        description,
        Category::new("Compute Engine", "Compute", group, usage_type),
        US_REGIONS,
        unit,
        vec![TierRate::new(0.0, "USD", nanos)],
    )
}

pub fn storage_sku(description: &str, group: &str, unit: &str, nanos: i64) -> Sku {
    Sku::new(
        description,
        Category::new("Compute Engine", "Storage", group, "OnDemand"),
        US_REGIONS,
        unit,
        vec![TierRate::new(0.0, "USD", nanos)],
    )
}

/// A small Americas catalog with N1, E2 and persistent disk prices.
pub fn americas_catalog() -> Vec<Sku> {
    vec![
        compute_sku("N1 Predefined Instance Core running in Americas", "N1Standard", "OnDemand", "hour", 31_611_000),
        compute_sku("N1 Predefined Instance Ram running in Americas", "N1Standard", "OnDemand", "gibibyte hour", 4_237_000),
        compute_sku("Preemptible N1 Predefined Instance Core running in Americas", "N1Standard", "Preemptible", "hour", 6_655_000),
        compute_sku("Preemptible N1 Predefined Instance Ram running in Americas", "N1Standard", "Preemptible", "gibibyte hour", 892_000),
        compute_sku("E2 Instance Core running in Americas", "CPU", "OnDemand", "hour", 21_811_590),
        compute_sku("E2 Instance Ram running in Americas", "RAM", "OnDemand", "gibibyte hour", 2_923_530),
        storage_sku("Storage PD Capacity", "PDStandard", "gibibyte month", 40_000_000),
        storage_sku("Regional Storage PD Capacity", "PDStandard", "gibibyte month", 80_000_000),
        storage_sku("SSD backed PD Capacity", "SSD", "gibibyte month", 170_000_000),
        Sku::new(
            "Network Internet Egress from Americas to Americas",
            Category::new("Compute Engine", "Network", "PremiumInternetEgress", "OnDemand"),
            &["global"],
            "gibibyte",
            vec![TierRate::new(0.0, "USD", 120_000_000)],
        ),
    ]
}

/// The catalog above in the Cloud Billing wire shape.
pub fn wire_sku(description: &str, family: &str, group: &str, usage_type: &str, unit: &str, nanos: i64) -> String {
    format!(
        r#"{{
            "description": "{}",
            "category": {{
                "serviceDisplayName": "Compute Engine",
                "resourceFamily": "{}",
                "resourceGroup": "{}",
                "usageType": "{}"
            }},
            "serviceRegions": ["us-central1", "us-east1", "us-west1"],
            "pricingInfo": [{{
                "pricingExpression": {{
                    "usageUnitDescription": "{}",
                    "tieredRates": [{{"startUsageAmount": 0, "unitPrice": {{"currencyCode": "USD", "units": "0", "nanos": {}}}}}]
                }}
            }}]
        }}"#,
        description, family, group, usage_type, unit, nanos
    )
}

pub fn wire_page(skus: &[String], next_page_token: &str) -> String {
    format!(
        r#"{{"skus": [{}], "nextPageToken": "{}"}}"#,
        skus.join(","),
        next_page_token
    )
}

/// A plan creating an n1-standard-1, deleting an e2-micro and resizing a disk.
pub const SAMPLE_PLAN: &str = r#"{
    "format_version": "0.1",
    "terraform_version": "0.12.24",
    "resource_changes": [
        {
            "address": "google_compute_instance.web",
            "mode": "managed",
            "type": "google_compute_instance",
            "name": "web",
            "change": {
                "actions": ["create"],
                "before": null,
                "after": {
                    "name": "web",
                    "machine_type": "n1-standard-1",
                    "zone": "us-central1-a",
                    "scheduling": [{"preemptible": false}]
                }
            }
        },
        {
            "address": "google_compute_instance.old",
            "mode": "managed",
            "type": "google_compute_instance",
            "name": "old",
            "change": {
                "actions": ["delete"],
                "before": {
                    "name": "old",
                    "instance_id": "1234567890",
                    "machine_type": "e2-micro",
                    "zone": "us-central1-b",
                    "scheduling": []
                },
                "after": null
            }
        },
        {
            "address": "google_compute_disk.data",
            "mode": "managed",
            "type": "google_compute_disk",
            "name": "data",
            "change": {
                "actions": ["update"],
                "before": {
                    "name": "data",
                    "id": "projects/p/zones/us-central1-a/disks/data",
                    "type": "pd-standard",
                    "zone": "us-central1-a",
                    "size": 100
                },
                "after": {
                    "name": "data",
                    "id": "projects/p/zones/us-central1-a/disks/data",
                    "type": "pd-standard",
                    "zone": "us-central1-a",
                    "size": 200
                }
            }
        },
        {
            "address": "google_storage_bucket.logs",
            "mode": "managed",
            "type": "google_storage_bucket",
            "name": "logs",
            "change": {
                "actions": ["create"],
                "before": null,
                "after": {"name": "logs"}
            }
        }
    ]
}"#;
