//! Seed data for `--demo`, so the harness runs without a database.

use serde_json::json;
use tatag_dashboard::store::MemoryStore;

pub const DEMO_PARENT_ID: &str = "parent-001";

pub fn seeded_store() -> MemoryStore {
    MemoryStore::with_data(json!({
        "Parents": {
            "parent-001": {
                "studentId": "student-001"
            },
            "parent-002": {
                "name": "Rosa Villanueva",
                "contact": "09181234567",
                "householdIncome": "₱15,001–20,000",
                "studentId": "student-002"
            }
        },
        "Students": {
            "student-001": {
                "name": "Carlos Mendoza",
                "classId": "class-3a",
                "preScore": { "pattern": 4, "numbers": 5 },
                "postScore": { "pattern": 0, "numbers": 0 }
            },
            "student-002": {
                "name": "Maria Villanueva",
                "nickname": "Mia",
                "classId": "class-3a",
                "preScore": { "pattern": 7, "numbers": 8 },
                "postScore": { "pattern": 9, "numbers": 9 }
            }
        },
        "Classes": {
            "class-3a": { "teacherId": "T-100" }
        },
        "Teachers": {
            "-NtA1": { "teacherId": "T-100", "name": " Juan Dela Cruz " }
        },
        "Announcements": {
            "-NaA1": {
                "classid": "class-3a",
                "teacherid": "T-100",
                "title": "Pretest schedule",
                "message": "The pretest will be held on Monday. Please make sure your child gets enough rest.",
                "date": "2024-01-08T08:00:00Z"
            },
            "-NaA2": {
                "classid": "class-3a",
                "teacherid": "T-100",
                "title": "Home exercise",
                "message": "Week 1 home exercises are now available in the game.",
                "date": "2024-02-12T09:30:00Z"
            },
            "-NaB1": {
                "classid": "class-4b",
                "title": "Field trip",
                "message": "Permission slips are due Friday.",
                "date": "2024-03-01T07:00:00Z"
            }
        }
    }))
}
