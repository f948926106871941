//! XPath locators for the analytics dashboard.

use report_calendar::PickerSide;

pub const USERNAME_INPUT: &str = r#"//input[@class="js-username-field email-input js-initial-focus"]"#;
pub const PASSWORD_INPUT: &str = r#"//input[@class="js-password-field"]"#;
pub const LOGIN_SUBMIT: &str = r#"//button[@type="submit"]"#;

pub const DATE_RANGE_BUTTON: &str = r#"//div[@class="btn daterange-button"]"#;
pub const APPLY_BUTTON: &str = r#"//button[@class="applyBtn btn btn-sm btn-primary"]"#;

pub const EXPORT_BUTTON: &str = r#"//div[@id="export"]/button[@class="btn btn-default ladda-button"]"#;
pub const ERROR_BANNER: &str = r#"//div[@class="error server Callout Callout--danger"]"#;

fn calendar(side: PickerSide) -> &'static str {
    match side {
        PickerSide::Start => r#"div[@class="calendar left"]"#,
        PickerSide::End => r#"div[@class="calendar right"]"#,
    }
}

fn table(side: PickerSide) -> String {
    format!(
        r#"//{}/div[@class="calendar-date"]/table[@class="table-condensed"]"#,
        calendar(side)
    )
}

/// Month/year header of one picker.
pub fn month_header(side: PickerSide) -> String {
    format!(r#"{}/thead/tr/th[@class="month"]"#, table(side))
}

pub fn previous_button(side: PickerSide) -> String {
    format!(
        r#"{}/thead/tr/th[@class="prev available"]/span[@class="Icon Icon--caretLeft Icon--tiny"]"#,
        table(side)
    )
}

pub fn next_button(side: PickerSide) -> String {
    format!(
        r#"{}/thead/tr/th[@class="next available"]/span[@class="Icon Icon--caretRight Icon--tiny"]"#,
        table(side)
    )
}

/// Selectable cell for `day` in the month a picker shows. Greyed-out days of
/// neighbouring months carry other classes and never match.
pub fn day_cell(side: PickerSide, day: u32) -> String {
    format!(
        r#"{}/tbody/tr/td[(@class="available" or @class="available in-range" or @class="available active start-date" or @class="available active end-date") and text()="{}"]"#,
        table(side),
        day
    )
}
