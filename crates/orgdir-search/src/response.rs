//! Wire representation of search results.

use orgdir_core::models::activity::Activity;
use orgdir_core::models::building::Building;
use orgdir_core::models::organization::Organization;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingResponse {
    pub id: Uuid,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: u8,
}

/// An organization with its building, phone numbers and activities inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub building: BuildingResponse,
    pub phones: Vec<String>,
    pub activities: Vec<ActivityResponse>,
}

impl From<&Building> for BuildingResponse {
    fn from(building: &Building) -> Self {
        Self {
            id: building.id,
            address: building.address.clone(),
            latitude: building.latitude,
            longitude: building.longitude,
        }
    }
}

impl From<&Activity> for ActivityResponse {
    fn from(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            name: activity.name.clone(),
            parent_id: activity.parent_id,
            level: activity.level,
        }
    }
}

impl From<&Organization> for OrganizationResponse {
    fn from(organization: &Organization) -> Self {
        Self {
            id: organization.id,
            name: organization.name.clone(),
            building: BuildingResponse::from(&organization.building),
            phones: organization
                .phones
                .iter()
                .map(|phone| phone.number.clone())
                .collect(),
            activities: organization
                .activities
                .iter()
                .map(ActivityResponse::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use orgdir_core::models::organization::Phone;

    use super::*;

    #[test]
    fn organization_maps_to_wire_shape() {
        let now = Utc::now();
        let building = Building {
            id: Uuid::now_v7(),
            address: "Main St, 1".into(),
            latitude: 55.751244,
            longitude: 37.618423,
            created_at: now,
            updated_at: now,
        };
        let food = Activity {
            id: Uuid::now_v7(),
            name: "Food".into(),
            parent_id: None,
            level: 1,
            created_at: now,
            updated_at: now,
        };
        let org_id = Uuid::now_v7();
        let organization = Organization {
            id: org_id,
            name: "Horns & Hooves LLC".into(),
            building: building.clone(),
            phones: vec![Phone {
                id: Uuid::now_v7(),
                organization_id: org_id,
                number: "+7 900 000-00-01".into(),
            }],
            activities: vec![food.clone()],
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(OrganizationResponse::from(&organization)).unwrap();
        assert_eq!(json["id"], org_id.to_string());
        assert_eq!(json["building"]["address"], "Main St, 1");
        assert_eq!(json["building"]["latitude"], 55.751244);
        assert_eq!(json["phones"], serde_json::json!(["+7 900 000-00-01"]));
        assert_eq!(json["activities"][0]["name"], "Food");
        assert_eq!(json["activities"][0]["parent_id"], serde_json::Value::Null);
        assert_eq!(json["activities"][0]["level"], 1);
        assert!(json.get("created_at").is_none());
    }
}
