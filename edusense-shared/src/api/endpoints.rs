use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::{API_V1_PREFIX, school_scope};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn auth_login(base: &str) -> String {
    base_join(base, &format!("{}/auth/login", API_V1_PREFIX))
}
pub fn version(base: &str) -> String {
    base_join(base, "/api/version")
}
pub fn students(base: &str, school_id: &str) -> String {
    base_join(base, &format!("{}/students", school_scope(school_id)))
}
pub fn student(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!("{}/students/{}", school_scope(school_id), enc(student_id)),
    )
}
pub fn student_fees(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/fees",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_fee_pay(base: &str, school_id: &str, student_id: &str, fee_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/fees/{}/pay",
            school_scope(school_id),
            enc(student_id),
            enc(fee_id)
        ),
    )
}
pub fn student_attendance(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/attendance",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_diary(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/diary",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_marks(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/marks",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_curriculum(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/curriculum",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_curriculum_generate(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/curriculum/generate",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_curriculum_download(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/curriculum/download",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_hall_tickets(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/hall-tickets",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn student_leaves(base: &str, school_id: &str, student_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/students/{}/leaves",
            school_scope(school_id),
            enc(student_id)
        ),
    )
}
pub fn routes(base: &str, school_id: &str) -> String {
    base_join(base, &format!("{}/routes", school_scope(school_id)))
}
pub fn route(base: &str, school_id: &str, route_id: &str) -> String {
    base_join(
        base,
        &format!("{}/routes/{}", school_scope(school_id), enc(route_id)),
    )
}
pub fn route_stop_statuses(base: &str, school_id: &str, route_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/routes/{}/stops/statuses",
            school_scope(school_id),
            enc(route_id)
        ),
    )
}
pub fn route_stop_report(base: &str, school_id: &str, route_id: &str, stop_id: &str) -> String {
    base_join(
        base,
        &format!(
            "{}/routes/{}/stops/{}/status",
            school_scope(school_id),
            enc(route_id),
            enc(stop_id)
        ),
    )
}
pub fn calendar(base: &str, school_id: &str) -> String {
    base_join(base, &format!("{}/calendar", school_scope(school_id)))
}
pub fn notifications(base: &str, school_id: &str) -> String {
    base_join(base, &format!("{}/notifications", school_scope(school_id)))
}
pub fn notifications_count(base: &str, school_id: &str) -> String {
    base_join(
        base,
        &format!("{}/notifications/count", school_scope(school_id)),
    )
}
pub fn notifications_trigger(base: &str, school_id: &str) -> String {
    base_join(
        base,
        &format!("{}/notifications/trigger", school_scope(school_id)),
    )
}
pub fn finance_overview(base: &str, school_id: &str) -> String {
    base_join(
        base,
        &format!("{}/finance/overview", school_scope(school_id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_are_percent_encoded() {
        let url = student_fees("http://localhost:8080/", "greenwood", "STU 001");
        assert_eq!(
            url,
            "http://localhost:8080/api/v1/school/greenwood/students/STU%20001/fees"
        );
    }

    #[test]
    fn base_join_strips_duplicate_slashes() {
        assert_eq!(
            auth_login("http://h/"),
            "http://h/api/v1/auth/login".to_string()
        );
    }
}
