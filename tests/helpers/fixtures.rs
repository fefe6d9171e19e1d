//! Fixture data shaped like backend answers

use serde_json::{json, Value};

pub fn event_registration(id: i64, user_id: &str, registered: Option<bool>) -> Value {
    json!({
        "id": id,
        "userId": user_id,
        "userName": format!("User {}", user_id),
        "email": format!("{}@ifpb.edu.br", user_id),
        "registered": registered,
    })
}

pub fn activity_registration(id: i64, user_id: &str, name: &str, present: bool) -> Value {
    json!({
        "id": id,
        "userId": user_id,
        "userName": name,
        "email": format!("{}@ifpb.edu.br", user_id),
        "present": present,
        "registered": true,
    })
}

pub fn activity(id: i64, name: &str, date: &str, category: &str, registrations: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": name,
        "location": "Auditório",
        "description": null,
        "activityDate": date,
        "activityTime": "14:00",
        "type": "palestra",
        "category": category,
        "registrations": registrations,
    })
}

pub fn event(id: i64, name: &str, date: &str, activities: Vec<Value>, registrations: Vec<Value>) -> Value {
    json!({
        "id": id,
        "name": name,
        "eventDate": date,
        "registrationDeadline": date,
        "maxRegistrations": 100,
        "description": "Semana acadêmica",
        "location": null,
        "photo": null,
        "activities": activities,
        "registrations": registrations,
    })
}

/// Event 1 on 2024-05-10 where `u1` is registered
pub fn scenario_event() -> Value {
    event(
        1,
        "Semana de Tecnologia",
        "2024-05-10",
        vec![activity(
            10,
            "Rust na prática",
            "2024-05-11",
            "Dev",
            vec![activity_registration(100, "u1", "Ana Souza", false)],
        )],
        vec![event_registration(50, "u1", Some(true))],
    )
}

/// Spring-style page wrapper
pub fn page(content: Vec<Value>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "totalPages": 1,
        "totalElements": total,
    })
}

pub fn roster_activity() -> Value {
    activity(
        7,
        "Oficina de Rust",
        "2024-05-10",
        "Dev",
        vec![
            activity_registration(1, "u1", "Ana Souza", true),
            activity_registration(2, "u2", "Bruno Lima", false),
            activity_registration(3, "u3", "Carla Dias", false),
        ],
    )
}

pub fn event_plan() -> Value {
    json!({
        "id": 4,
        "name": "Semana de Computação",
        "eventDate": "2024-06-03",
        "microphones": 2,
        "projectors": 1,
        "rooms": "Auditório\n\nSala 101\n",
        "members": "Ana\nBruno",
    })
}
