//! HTML rendering of a solved timetable: one table per room, one row per teaching hour, one
//! column per weekday, with the five per-class criterion flags shown as coloured letter
//! markers.

use std::collections::HashMap;

use chrono::Local;

use crate::core::{Reservation, Schedule, CRITERIA_NUM, DAYS_NUM, DAY_HOURS};

const COLOR_OK: &str = "#319378";
const COLOR_BAD: &str = "#CE0000";

const CRITERION_LETTERS: [char; CRITERIA_NUM] = ['R', 'S', 'L', 'P', 'G'];
const CRITERION_DESCRIPTIONS: [&str; CRITERIA_NUM] = [
    "Current room has {}overlapping",
    "Current room has {}enough seats",
    "Current room with {}enough computers if they are required",
    "Professors have {}overlapping classes",
    "Student groups has {}overlapping classes",
];

const PERIODS: [&str; DAY_HOURS + 1] = [
    "", "9 - 10", "10 - 11", "11 - 12", "12 - 13", "13 - 14", "14 - 15", "15 - 16", "16 - 17",
    "17 - 18", "18 - 19", "19 - 20", "20 - 21",
];
const WEEK_DAYS: [&str; DAYS_NUM] = ["MON", "TUE", "WED", "THU", "FRI"];

/// One row (columns: label + weekdays) per `(hour, room)` key.
type SlotTable<T> = HashMap<(usize, usize), Vec<T>>;

fn criterion_title(criterion: usize, satisfied: bool) -> String {
    // seats and laboratory read as positive statements, the others as overlaps
    let positive = criterion == 1 || criterion == 2;
    let filler = match (positive, satisfied) {
        (true, true) | (false, false) => "",
        (true, false) => "not ",
        (false, true) => "no ",
    };
    CRITERION_DESCRIPTIONS[criterion].replace("{}", filler)
}

fn class_cell_markup(solution: &Schedule, class_id: usize) -> String {
    let configuration = solution.configuration();
    let class = &configuration.course_classes()[class_id];

    let course_name = configuration
        .course(class.course_id())
        .map(|course| course.name().to_string())
        .unwrap_or_default();
    let professor_name = configuration
        .professor(class.professor_id())
        .map(|professor| professor.name().to_string())
        .unwrap_or_default();
    let group_names: Vec<&str> = class
        .group_ids()
        .iter()
        .filter_map(|&group_id| configuration.students_group(group_id).map(|g| g.name()))
        .collect();

    let mut markup = format!(
        "{}<br />{}<br />{}<br />",
        course_name,
        professor_name,
        group_names.join("/")
    );
    if class.lab_required() {
        markup.push_str("Lab<br />");
    }

    for criterion in 0..CRITERIA_NUM {
        let satisfied = solution.criteria()[class_id * CRITERIA_NUM + criterion];
        let color = if satisfied { COLOR_OK } else { COLOR_BAD };
        markup.push_str(&format!(
            "<span style='color:{}' title='{}'> {} </span>",
            color,
            criterion_title(criterion, satisfied),
            CRITERION_LETTERS[criterion]
        ));
    }
    markup
}

/// Spread the solved classes over per-room grids: `durations` records the rowspan of each
/// starting cell (and `-1` for the covered continuation rows), `contents` the cell markup.
fn generate_time_table(
    solution: &Schedule,
    durations: &mut SlotTable<i32>,
    contents: &mut SlotTable<Option<String>>,
) {
    let number_of_rooms = solution.configuration().number_of_rooms();
    let columns = DAYS_NUM + 1;

    for (class_id, entry) in solution.class_table().iter().enumerate() {
        let Some(index) = *entry else {
            continue;
        };
        let reservation = Reservation::parse(index, number_of_rooms);
        let day = reservation.day + 1;
        let time = reservation.time + 1;
        let duration = solution.configuration().course_classes()[class_id].duration();

        let row = durations
            .entry((time, reservation.room))
            .or_insert_with(|| vec![0; columns]);
        row[day] = duration as i32;

        // continuation rows are blocked out so the rowspan is not doubled
        for covered in 1..duration {
            let row = durations
                .entry((time + covered, reservation.room))
                .or_insert_with(|| vec![0; columns]);
            if row[day] < 1 {
                row[day] = -1;
            }
        }

        let row = contents
            .entry((time, reservation.room))
            .or_insert_with(|| vec![None; columns]);
        row[day] = Some(class_cell_markup(solution, class_id));
    }
}

fn html_cell(content: Option<&String>, rowspan: i32) -> String {
    if rowspan == 0 {
        return "<td></td>".to_string();
    }
    let Some(content) = content else {
        return String::new();
    };

    if rowspan > 1 {
        format!(
            "<td style='border: 1px solid black; padding: 5px' rowspan='{rowspan}'>{content}</td>"
        )
    } else {
        format!("<td style='border: 1px solid black; padding: 5px'>{content}</td>")
    }
}

fn table_header(room: &crate::core::Room) -> String {
    let mut header = format!(
        "<tr><th style='border: 1px solid black' scope='col' colspan='2'>Room: {}</th>\n",
        room.name()
    );
    for week_day in WEEK_DAYS {
        header.push_str(&format!(
            "<th style='border: 1px solid black; padding: 5px; width: 15%' scope='col' rowspan='2'>{week_day}</th>\n"
        ));
    }
    header.push_str("</tr>\n<tr>\n");
    header.push_str(&format!(
        "<th style='border: 1px solid black; padding: 5px'>Lab: {}</th>\n",
        room.is_lab()
    ));
    header.push_str(&format!(
        "<th style='border: 1px solid black; padding: 5px'>Seats: {}</th>\n",
        room.seats()
    ));
    header.push_str("</tr>\n");
    header
}

/// Render the timetable tables of a solved schedule. An empty timetable renders to an empty
/// string.
///
/// # Arguments
///
/// * `solution`: The solved chromosome.
///
/// returns: `String`
pub fn render(solution: &Schedule) -> String {
    let configuration = solution.configuration();
    let number_of_rooms = configuration.number_of_rooms();

    let mut durations: SlotTable<i32> = HashMap::new();
    let mut contents: SlotTable<Option<String>> = HashMap::new();
    generate_time_table(solution, &mut durations, &mut contents);
    if durations.is_empty() || contents.is_empty() {
        return String::new();
    }

    let mut html = String::new();
    for room_id in 0..number_of_rooms {
        let room = configuration.room(room_id);
        html.push_str(&format!("<div id='room_{}' style='padding: 0.5em'>\n", room.name()));
        html.push_str("<table style='border-collapse: collapse; width: 95%'>\n");
        html.push_str(&table_header(room));

        for period in 1..=DAY_HOURS {
            let key = (period, room_id);
            let row_durations = durations.get(&key);
            let row_contents = contents.get(&key);

            html.push_str("<tr>");
            html.push_str(&format!(
                "<th style='border: 1px solid black; padding: 5px' scope='row' colspan='2'>{}</th>\n",
                PERIODS[period]
            ));
            if row_durations.is_some() || row_contents.is_some() {
                for day in 1..=DAYS_NUM {
                    let content = row_contents.and_then(|row| row[day].as_ref());
                    let rowspan = row_durations.map(|row| row[day]).unwrap_or(0);
                    html.push_str(&html_cell(content, rowspan));
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n</div>\n");
    }
    html
}

/// Render a full standalone HTML document around [`render`].
pub fn render_document(solution: &Schedule) -> String {
    let body = render(solution);
    format!(
        "<html>\n<head>\n<title>Class Schedule</title>\n</head>\n<body>\n\
         <p>Generated on {}</p>\n{}\n</body>\n</html>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        body
    )
}

#[cfg(test)]
mod test {
    use crate::core::test_utils::{prototype_from, schedule_config, SINGLE_CLASS_CONFIG};
    use crate::utils::get_rng;

    use super::render;

    #[test]
    /// An empty timetable renders to an empty string.
    fn test_empty_schedule() {
        let prototype = prototype_from("[]");
        let mut rng = get_rng(Some(70));
        let solution = prototype.new_from_prototype(&mut rng, None);
        assert_eq!(render(&solution), "");
    }

    #[test]
    /// A scheduled class renders its room table with the criterion markers.
    fn test_single_class_render() {
        let prototype = prototype_from(SINGLE_CLASS_CONFIG);
        let mut rng = get_rng(Some(72));
        let solution = prototype.new_from_prototype(&mut rng, None);
        let html = render(&solution);

        assert!(html.contains("Room: Lab"));
        assert!(html.contains("Numerical methods"));
        assert!(html.contains("Ada"));
        assert!(html.contains("Lab<br />"));
        for letter in ["> R <", "> S <", "> L <", "> P <", "> G <"] {
            assert!(html.contains(letter));
        }
    }

    #[test]
    /// A multi-hour class renders one starting cell with a matching rowspan.
    fn test_rowspan_for_long_class() {
        let prototype = prototype_from(&schedule_config(4, 1));
        let mut rng = get_rng(Some(74));
        let solution = prototype.new_from_prototype(&mut rng, None);
        let html = render(&solution);
        assert!(html.contains("rowspan='4'"));
    }
}
