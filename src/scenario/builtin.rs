//! Built-in scenarios for the auth API
//!
//! Emails embed `{{vars.run_id}}` so repeated runs against the same
//! backend register fresh users instead of colliding with earlier runs.

use serde_json::{json, Value};

use super::config::Scenario;
use super::expect::{error_fields, Expectation};
use super::step::{RequestSpec, Step, Verdict};
use crate::common::{Error, Result};

/// Name and one-line description of every built-in scenario
pub const BUILTINS: &[(&str, &str)] = &[
    (
        "connection",
        "Health, root 404, bad login, registration and login with the new user",
    ),
    (
        "registration",
        "Register a customer with a correctly formatted payload, then log in",
    ),
    (
        "validation",
        "Probe which password formats the backend accepts at registration",
    ),
    (
        "roles",
        "Register and log in both a customer and a room owner",
    ),
];

/// Build a built-in scenario by name
pub fn builtin(name: &str) -> Result<Scenario> {
    match name {
        "connection" => Ok(connection()),
        "registration" => Ok(registration()),
        "validation" => Ok(validation(&[None, None, None])),
        "roles" => Ok(roles()),
        _ => Err(Error::UnknownBuiltin(name.to_string())),
    }
}

fn connection() -> Scenario {
    Scenario::new("connection")
        .describe("Checks that the backend is reachable and the auth endpoints respond")
        .step(health_step("health"))
        .step(Step::new(
            "root",
            RequestSpec::get("{{base.origin}}/"),
            Expectation::new().status(404),
        ))
        .step(Step::new(
            "login-invalid",
            RequestSpec::post(
                "/auth/login",
                json!({"email": "test@example.com", "password": "wrongpassword"}),
            ),
            Expectation::new().status_in(&[400, 401, 404]).success(false),
        ))
        .step(register_step(
            "register",
            user("Test", "User", "testuser", "TestPass123!", "9876543210", "customer"),
            "customer",
        ))
        .step(login_step("login", "register", "customer"))
}

fn registration() -> Scenario {
    Scenario::new("registration")
        .describe("Registers a user that satisfies every documented field rule, then logs in")
        .step(register_step(
            "register",
            user(
                "Jane",
                "Smith",
                "jane.smith.correct",
                "TestPass123!",
                "9876543216",
                "customer",
            ),
            "customer",
        ))
        .step(login_step("login", "register", "customer"))
}

/// Password probe; `expected[i]` pins whether variant `i` must be accepted
///
/// Password rules belong to the backend, so by default each variant only
/// checks that the backend gave a well-formed answer.
fn validation(expected: &[Option<bool>; 3]) -> Scenario {
    let variants = [
        ("strong-password", "User1", "test1", "TestPass123!", "9876543213"),
        ("simple-password", "User2", "test2", "password123", "9876543214"),
        ("short-password", "User3", "test3", "test123", "9876543215"),
    ];

    let mut scenario = Scenario::new("validation")
        .describe("Reports which password formats the backend accepts");
    for ((name, last, local, password, phone), accept) in variants.into_iter().zip(expected) {
        scenario = scenario.step(Step::new(
            name,
            RequestSpec::post(
                "/auth/register",
                user("Test", last, local, password, phone, "customer"),
            ),
            password_probe(*accept),
        ));
    }
    scenario
}

fn roles() -> Scenario {
    Scenario::new("roles")
        .describe("Registers and logs in one user per role")
        .step(health_step("health"))
        .step(register_step(
            "register-customer",
            user("Jane", "Smith", "jane.smith", "SimplePass123", "9876543211", "customer"),
            "customer",
        ))
        .step(login_step("login-customer", "register-customer", "customer"))
        .step(register_step(
            "register-owner",
            user("Bob", "Owner", "bob.owner", "OwnerPass123", "9876543212", "room_owner"),
            "room_owner",
        ))
        .step(login_step("login-owner", "register-owner", "room_owner"))
}

fn user(first: &str, last: &str, local: &str, password: &str, phone: &str, role: &str) -> Value {
    json!({
        "first_name": first,
        "last_name": last,
        "email": format!("{}+{{{{vars.run_id}}}}@example.com", local),
        "password": password,
        "phone": phone,
        "role": role,
    })
}

fn health_step(name: &str) -> Step {
    Step::new(name, RequestSpec::get("/health"), |status: u16, body: &Value| {
        if status != 200 {
            return Verdict::fail(format!("expected HTTP 200, got {}", status));
        }
        let mut verdict = Verdict::pass();
        for key in ["status", "environment"] {
            if let Some(value) = body.get(key) {
                verdict = verdict.extract(key, value.clone());
            }
        }
        verdict
    })
}

fn register_step(name: &str, body: Value, role: &str) -> Step {
    Step::new(
        name,
        RequestSpec::post("/auth/register", body),
        Expectation::new()
            .status(201)
            .success(true)
            .field_equals("/data/user/role", role)
            .field_not_empty("/data/token")
            .extract("user_id", "/data/user/id")
            .extract("role", "/data/user/role")
            .extract("token", "/data/token"),
    )
}

fn login_step(name: &str, registration: &str, role: &str) -> Step {
    Step::new(
        name,
        RequestSpec::post(
            "/auth/login",
            json!({
                "email": format!("{{{{{}.request.email}}}}", registration),
                "password": format!("{{{{{}.request.password}}}}", registration),
            }),
        ),
        Expectation::new()
            .status(200)
            .success(true)
            .field_equals("/data/user/role", role)
            .field_not_empty("/data/token")
            .extract("role", "/data/user/role")
            .extract("token", "/data/token"),
    )
    .depends_on(registration)
}

fn password_probe(expected: Option<bool>) -> impl Fn(u16, &Value) -> Verdict + Send + Sync {
    move |status: u16, body: &Value| {
        let Some(accepted) = body.get("success").and_then(Value::as_bool) else {
            return Verdict::fail("response has no boolean 'success'");
        };
        if accepted != (status == 201) {
            return Verdict::fail(format!(
                "success={} does not match HTTP {}",
                accepted, status
            ));
        }
        if let Some(expected) = expected {
            if accepted != expected {
                return Verdict::fail(format!(
                    "expected the backend to {} this password",
                    if expected { "accept" } else { "reject" }
                ));
            }
        }

        let mut verdict = Verdict::pass().extract("accepted", accepted);
        if !accepted {
            let fields = error_fields(body);
            if let Some(message) = body.get("message") {
                verdict = verdict.extract("message", message.clone());
            }
            verdict = verdict.extract("error_fields", fields);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_are_valid() {
        for (name, _) in BUILTINS {
            let scenario = builtin(name).unwrap();
            assert_eq!(scenario.name, *name);
            scenario.validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(
            builtin("nope").unwrap_err(),
            Error::UnknownBuiltin(_)
        ));
    }

    #[test]
    fn test_login_reuses_registration_values() {
        let scenario = builtin("registration").unwrap();
        let login = &scenario.steps[1];
        assert_eq!(login.depends_on.as_deref(), Some("register"));
        assert_eq!(
            login.request.body,
            Some(json!({
                "email": "{{register.request.email}}",
                "password": "{{register.request.password}}"
            }))
        );
        assert_eq!(
            scenario.steps[0].request.body.as_ref().unwrap()["email"],
            json!("jane.smith.correct+{{vars.run_id}}@example.com")
        );
    }

    #[test]
    fn test_password_probe_reports_backend_decision() {
        let probe = password_probe(None);
        let rejected = json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{"field": "password", "message": "too weak"}]
        });

        let verdict = probe(400, &rejected);
        assert!(verdict.passed);
        assert_eq!(verdict.extracted["accepted"], json!(false));
        assert_eq!(verdict.extracted["error_fields"], json!(["password"]));

        assert!(probe(201, &json!({"success": true})).passed);
        assert!(!probe(500, &json!("oops")).passed);
        assert!(!probe(201, &json!({"success": false})).passed);
    }

    #[test]
    fn test_password_probe_with_pinned_expectation() {
        let must_reject = password_probe(Some(false));
        assert!(!must_reject(201, &json!({"success": true})).passed);
        assert!(must_reject(422, &json!({"success": false})).passed);
    }
}
