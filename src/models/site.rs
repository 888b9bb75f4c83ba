//! Static catalogue of office locations and their departments

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub location: &'static str,
    pub departments: &'static [&'static str],
}

pub static SITES: &[Site] = &[
    Site {
        location: "New Composite Building",
        departments: &[
            "Additional Collector Office",
            "Deputy District Election Officer",
            "General Election",
            "Joint Director Treasury Accounts and Pension",
            "Assistant Labour Commissioner",
            "District Trade and Industry Centre",
            "Deputy Director Local Fund Audit",
            "District Planning and Statistics",
            "Assistant Registrar Firms and Societies",
            "Joint Director Village and Town Investment",
            "Civil Supplies Corporation",
            "Mukhya Mantri Gram Sadak Yojna",
            "Food and Drug Administration",
            "District Auditor Panchayat",
        ],
    },
    Site {
        location: "Collector Office",
        departments: &[
            "District Mineral Department",
            "District Food Department",
            "Collector Steno Branch",
            "Collector Finance Branch",
            "Collector Superintendent Branch",
            "Collector Room",
            "Collector Court Room",
            "District Nazir Room",
            "District Treasury Branch",
            "Protocol Branch",
            "Public Grievance Branch",
            "Deputy Collector Room",
            "City Magistrate Court Room",
            "Land Records",
            "Assistant Superintendent Land Records",
            "Additional Collector Room 1",
            "Additional Collector Room 2",
            "Additional Collector Steno Room",
            "Additional Collector Court Room",
            "Relief Branch",
            "Small Savings Branch",
        ],
    },
    Site {
        location: "District Panchayat",
        departments: &[
            "MGNREGA Branch",
            "Bihan Branch",
            "Pradhan Mantri Awas Yojana",
            "District Panchayat CEO",
            "CEO Steno Room",
            "Meeting Hall",
            "Swachh Bharat Mission",
            "Establishment Branch",
            "National Rural Livelihood Mission",
        ],
    },
    Site {
        location: "District Excise",
        departments: &["Office", "District Excise Officer"],
    },
    Site {
        location: "Family Court",
        departments: &["Office"],
    },
    Site {
        location: "Divisional Commissioner Office",
        departments: &[
            "Divisional Commissioner Office",
            "Additional Division Commissioner Office",
            "Steno Room",
            "Establishment Branch",
            "Divisional Commissioner Court Room",
        ],
    },
    Site {
        location: "Passport Branch",
        departments: &["Office"],
    },
    Site {
        location: "District Superintendent of Police",
        departments: &[
            "Superintendent of Police Room",
            "Steno Room",
            "Establishment Branch",
            "Additional Superintendent of Police",
            "CCTNS Room",
        ],
    },
    Site {
        location: "Assistant Commissioner State Tax",
        departments: &["Establishment Branch", "Assistant Commissioner Room"],
    },
    Site {
        location: "GST Office",
        departments: &["Office Circle 1", "Office Circle 2", "Office Circle 3"],
    },
    Site {
        location: "NIC Office",
        departments: &["NIC Office"],
    },
    Site {
        location: "Consumer Forum",
        departments: &["Consumer Forum"],
    },
    Site {
        location: "District Court",
        departments: &["District Court"],
    },
];

/// Whether the department belongs to the location
pub fn is_known_site(location: &str, department: &str) -> bool {
    SITES
        .iter()
        .any(|s| s.location == location && s.departments.contains(&department))
}
