//! Canonical demo dataset, served instead of backend data when
//! `PortalConfig::demo_mode` is on and used as the base for unit tests.

use chrono::{DateTime, Utc};

use crate::announcement::Announcement;
use crate::model::{
    AnnouncementId, Complaint, ComplaintId, Location, Media, Priority, ReporterRef, Status,
    Timestamps, UserId,
};
use crate::taxonomy::{Category, CategoryLabel};

pub const DEMO_CITIZEN_ID: &str = "demo-citizen";

fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap_or_default()
}

/// A pending, medium-priority complaint filed by the demo citizen.
#[must_use]
pub fn complaint(id: &str, title: &str) -> Complaint {
    let filed = at("2024-06-01T08:00:00Z");
    Complaint {
        id: ComplaintId::new(id),
        tracking_id: format!("CMP-{}", id.to_uppercase()),
        title: title.to_string(),
        description: String::new(),
        category: CategoryLabel::canonical(Category::PublicWorks),
        location: None,
        reporter: Some(ReporterRef::Id(UserId::new(DEMO_CITIZEN_ID))),
        upvotes: 0,
        has_upvoted: false,
        priority: Priority::Medium,
        status: Status::Pending,
        media: Media::default(),
        is_anonymous: false,
        created_at: Some(filed),
        timestamps: Timestamps {
            filed: Some(filed),
            in_progress: None,
            resolved: None,
        },
        assigned_to: None,
        admin_notes: None,
    }
}

struct Row {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: Category,
    ward: &'static str,
    locality: &'static str,
    status: Status,
    priority: Priority,
    upvotes: u32,
    filed: &'static str,
    mine: bool,
    anonymous: bool,
}

const ROWS: [Row; 8] = [
    Row {
        id: "d1",
        title: "Pothole on Western Express Highway",
        description: "Large pothole in the left lane causing vehicles to swerve suddenly.",
        category: Category::PublicWorks,
        ward: "K/West",
        locality: "Andheri West",
        status: Status::Pending,
        priority: Priority::High,
        upvotes: 42,
        filed: "2024-06-02T09:15:00Z",
        mine: false,
        anonymous: false,
    },
    Row {
        id: "d2",
        title: "Broken Streetlight near Station",
        description: "Streetlight outside the east exit has been off for a week.",
        category: Category::Electricity,
        ward: "H/East",
        locality: "Bandra East",
        status: Status::InProgress,
        priority: Priority::Medium,
        upvotes: 28,
        filed: "2024-05-30T18:40:00Z",
        mine: true,
        anonymous: false,
    },
    Row {
        id: "d3",
        title: "Garbage not collected for 3 days",
        description: "Bins overflowing on the main lane, attracting stray animals.",
        category: Category::Environment,
        ward: "A",
        locality: "Colaba",
        status: Status::Resolved,
        priority: Priority::High,
        upvotes: 67,
        filed: "2024-05-25T07:05:00Z",
        mine: true,
        anonymous: false,
    },
    Row {
        id: "d4",
        title: "Water leakage in main pipeline",
        description: "Continuous leakage from the main pipeline near the market.",
        category: Category::WaterSupply,
        ward: "P/South",
        locality: "Goregaon",
        status: Status::InProgress,
        priority: Priority::High,
        upvotes: 51,
        filed: "2024-05-28T11:30:00Z",
        mine: false,
        anonymous: false,
    },
    Row {
        id: "d5",
        title: "Illegal construction blocking road",
        description: "Construction material dumped on the road, blocking one lane.",
        category: Category::UrbanPlanning,
        ward: "K/East",
        locality: "Andheri East",
        status: Status::Pending,
        priority: Priority::Medium,
        upvotes: 89,
        filed: "2024-06-01T16:20:00Z",
        mine: false,
        anonymous: true,
    },
    Row {
        id: "d6",
        title: "Stray dogs causing safety concerns",
        description: "A pack of stray dogs has been aggressive towards pedestrians in the area. Requesting animal control intervention.",
        category: Category::AnimalWelfare,
        ward: "D",
        locality: "Malabar Hill",
        status: Status::Pending,
        priority: Priority::Low,
        upvotes: 34,
        filed: "2024-06-03T06:45:00Z",
        mine: true,
        anonymous: false,
    },
    Row {
        id: "d7",
        title: "Overflowing drain on SV Road",
        description: "Drain overflows after every shower and floods the footpath.",
        category: Category::WaterSupply,
        ward: "R/South",
        locality: "Kandivali West",
        status: Status::Pending,
        priority: Priority::Low,
        upvotes: 12,
        filed: "2024-06-03T12:10:00Z",
        mine: false,
        anonymous: false,
    },
    Row {
        id: "d8",
        title: "Bus stop shelter damaged",
        description: "Roof of the bus stop shelter collapsed during the storm.",
        category: Category::PublicAmenities,
        ward: "G/North",
        locality: "Dadar",
        status: Status::Resolved,
        priority: Priority::Medium,
        upvotes: 19,
        filed: "2024-05-20T10:00:00Z",
        mine: false,
        anonymous: false,
    },
];

impl Row {
    fn build(&self, index: usize) -> Complaint {
        let filed = at(self.filed);
        let day = chrono::Duration::days(1);
        let in_progress = (self.status != Status::Pending).then(|| filed + day);
        let resolved = (self.status == Status::Resolved).then(|| filed + day + day);
        let reporter = if self.mine {
            UserId::new(DEMO_CITIZEN_ID)
        } else {
            UserId::new(format!("citizen-{index}"))
        };

        Complaint {
            id: ComplaintId::new(self.id),
            tracking_id: format!("CMP-2024-{:04}", index + 1),
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: CategoryLabel::canonical(self.category),
            location: Some(Location {
                address: None,
                ward: Some(self.ward.to_string()),
                locality: Some(self.locality.to_string()),
            }),
            reporter: Some(ReporterRef::Id(reporter)),
            upvotes: self.upvotes,
            has_upvoted: false,
            priority: self.priority,
            status: self.status,
            media: Media::default(),
            is_anonymous: self.anonymous,
            created_at: Some(filed),
            timestamps: Timestamps {
                filed: Some(filed),
                in_progress,
                resolved,
            },
            assigned_to: None,
            admin_notes: None,
        }
    }
}

#[must_use]
pub fn demo_complaints() -> Vec<Complaint> {
    ROWS.iter().enumerate().map(|(i, row)| row.build(i)).collect()
}

#[must_use]
pub fn demo_announcements() -> Vec<Announcement> {
    let item = |id: &str,
                name: &str,
                designation: &str,
                department: &str,
                published: &str,
                title: &str,
                body: &str,
                category: &str,
                likes: u32| Announcement {
        id: AnnouncementId::new(id),
        title: title.to_string(),
        body: body.to_string(),
        category: category.to_string(),
        admin_name: name.to_string(),
        admin_designation: Some(designation.to_string()),
        admin_department: Some(department.to_string()),
        published_at: Some(at(published)),
        image: None,
        likes,
        is_liked: false,
    };

    vec![
        item(
            "a1",
            "Rajesh Nair",
            "Municipal Officer",
            "Public Works Dept.",
            "2024-06-03T08:00:00Z",
            "Clean City Week Begins!",
            "Clean City Week starts Monday. Citizens are encouraged to join neighbourhood cleanup drives; special waste collection drives will run in all wards.",
            "Awareness",
            234,
        ),
        item(
            "a2",
            "Priya Deshmukh",
            "Traffic Commissioner",
            "Traffic Management",
            "2024-06-03T05:00:00Z",
            "Road Closure Notice - Marine Drive",
            "Marine Drive will be closed to traffic from 6 AM to 12 PM on Sunday for the city marathon. Use Pedder Road or Annie Besant Road instead.",
            "Maintenance",
            456,
        ),
        item(
            "a3",
            "Amit Sharma",
            "Senior Officer",
            "Urban Development",
            "2024-06-02T10:00:00Z",
            "New Garden Inauguration in Bandra",
            "A new public garden with a children's play area and walking tracks opens at Bandra West on June 10th at 9 AM.",
            "Public Event",
            789,
        ),
        item(
            "a4",
            "Kavita Mehta",
            "Health Officer",
            "Public Health Dept.",
            "2024-06-01T10:00:00Z",
            "Free Health Checkup Camp - This Weekend",
            "Free health checkups at all municipal hospitals this weekend, 9 AM to 5 PM. No appointment needed.",
            "Public Event",
            567,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_demo_complaints_are_consistent() {
        let complaints = demo_complaints();
        let ids: HashSet<_> = complaints.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), complaints.len());
        for c in &complaints {
            assert!(c.timestamps_consistent(), "{} has inconsistent stamps", c.id);
            assert!(c.created_at().is_some());
        }
    }

    #[test]
    fn test_demo_set_covers_every_status() {
        let complaints = demo_complaints();
        for status in Status::ALL {
            assert!(complaints.iter().any(|c| c.status == status));
        }
        assert!(complaints
            .iter()
            .any(|c| c.reporter_id().map(UserId::as_str) == Some(DEMO_CITIZEN_ID)));
    }

    #[test]
    fn test_helper_complaint_is_pending() {
        let c = complaint("x", "Title");
        assert_eq!(c.status, Status::Pending);
        assert!(c.timestamps_consistent());
    }

    #[test]
    fn test_demo_announcements() {
        let items = demo_announcements();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|a| a.published_at.is_some()));
    }
}
