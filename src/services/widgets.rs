// src/services/widgets.rs
//! HTML snippets for embedding events on a page.
use crate::models::{Event, EventList};

pub const NO_EVENTS_MESSAGE: &str = "No events were found at this time.";

/// Wraps one rendered row per event in the list container.
pub fn event_list<F>(events: &EventList, row: F) -> Result<String, chrono::ParseError>
where
    F: Fn(&Event) -> Result<String, chrono::ParseError>,
{
    let mut html = vec![r#"<div class="eb_event_list">"#.to_string()];

    let events = events.events();
    if events.is_empty() {
        html.push(NO_EVENTS_MESSAGE.to_string());
    } else {
        for event in &events {
            html.push(row(event)?);
        }
    }

    html.push("</div>".to_string());
    Ok(html.join("\n"))
}

pub fn event_list_row(event: &Event) -> Result<String, chrono::ParseError> {
    let start = event.start()?;
    let venue = event.venue_name().unwrap_or("online");

    Ok(format!(
        r#"<div class="eb_event_list_item" id="evnt_div_{id}"><span class="eb_event_list_date">{date}</span><span class="eb_event_list_time">{time}</span><a class="eb_event_list_title" href="{url}">{title}</a><span class="eb_event_list_location">{venue}</span></div>"#,
        id = event.id,
        date = start.format("%a, %B %e"),
        time = start.format("%l:%M %P"),
        url = event.url,
        title = event.title,
        venue = venue,
    ))
}

pub fn ticket_widget(event: &Event) -> String {
    format!(
        r#"<div style="width:100%; text-align:left;"><iframe src="http://www.eventbrite.com/tickets-external?eid={id}&ref=etckt" frameborder="0" height="192" width="100%" vspace="0" hspace="0" marginheight="5" marginwidth="5" scrolling="auto" allowtransparency="true"></iframe><div style="font-family:Helvetica, Arial; font-size:10px; padding:5px 0 5px; margin:2px; width:100%; text-align:left;"><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/r/etckt">Online Ticketing</a><span style="color:#ddd;"> for </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/event/{id}?ref=etckt">{title}</a><span style="color:#ddd;"> powered by </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com?ref=etckt">Eventbrite</a></div></div>"#,
        id = event.id,
        title = event.title,
    )
}

pub fn registration_widget(event: &Event) -> String {
    format!(
        r#"<div style="width:100%; text-align:left;"><iframe src="http://www.eventbrite.com/event/{id}?ref=eweb" frameborder="0" height="1000" width="100%" vspace="0" hspace="0" marginheight="5" marginwidth="5" scrolling="auto" allowtransparency="true"></iframe><div style="font-family:Helvetica, Arial; font-size:10px; padding:5px 0 5px; margin:2px; width:100%; text-align:left;"><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/r/eweb">Online Ticketing</a><span style="color:#ddd;"> for </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/event/{id}?ref=eweb">{title}</a><span style="color:#ddd;"> powered by </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com?ref=eweb">Eventbrite</a></div></div>"#,
        id = event.id,
        title = event.title,
    )
}

pub fn calendar_widget(event: &Event) -> String {
    format!(
        r#"<div style="width:195px; text-align:center;"><iframe src="http://www.eventbrite.com/calendar-widget?eid={id}" frameborder="0" height="382" width="195" marginheight="0" marginwidth="0" scrolling="no" allowtransparency="true"></iframe><div style="font-family:Helvetica, Arial; font-size:10px; padding:5px 0 5px; margin:2px; width:195px; text-align:center;"><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/r/ecal">Online event registration</a><span style="color:#ddd;"> powered by </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com?ref=ecal">Eventbrite</a></div></div>"#,
        id = event.id,
    )
}

pub fn countdown_widget(event: &Event) -> String {
    format!(
        r#"<div style="width:195px; text-align:center;"><iframe src="http://www.eventbrite.com/countdown-widget?eid={id}" frameborder="0" height="479" width="195" marginheight="0" marginwidth="0" scrolling="no" allowtransparency="true"></iframe><div style="font-family:Helvetica, Arial; font-size:10px; padding:5px 0 5px; margin:2px; width:195px; text-align:center;"><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/r/ecount">Online event registration</a><span style="color:#ddd;"> for </span><a style="color:#ddd; text-decoration:none;" target="_blank" href="http://www.eventbrite.com/event/{id}?ref=ecount">{title}</a></div></div>"#,
        id = event.id,
        title = event.title,
    )
}

pub fn button_widget(event: &Event) -> String {
    format!(
        r#"<a href="http://www.eventbrite.com/event/{id}?ref=ebtn" target="_blank"><img border="0" src="http://www.eventbrite.com/custombutton?eid={id}" alt="Register for {title} on Eventbrite" /></a>"#,
        id = event.id,
        title = event.title,
    )
}

/// Plain link; `text` defaults to the event title and `color` to black.
pub fn link_widget(event: &Event, text: Option<&str>, color: Option<&str>) -> String {
    format!(
        r#"<a href="http://www.eventbrite.com/event/{id}?ref=elink" target="_blank" style="color:{color};">{text}</a>"#,
        id = event.id,
        color = color.unwrap_or("#000000"),
        text = text.unwrap_or(&event.title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meetup() -> Event {
        serde_json::from_value(json!({
            "id": 123,
            "title": "Rust Meetup",
            "url": "http://www.eventbrite.com/event/123",
            "start_date": "2020-01-10 18:05:00",
            "venue": {"name": "Hall B"}
        }))
        .unwrap()
    }

    #[test]
    fn list_row_formats_date_time_and_venue() {
        let row = event_list_row(&meetup()).unwrap();
        assert!(row.starts_with(r#"<div class="eb_event_list_item" id="evnt_div_123">"#));
        assert!(row.contains(r#"<span class="eb_event_list_date">Fri, January 10</span>"#));
        assert!(row.contains(r#"<span class="eb_event_list_time"> 6:05 pm</span>"#));
        assert!(row.contains(r#"href="http://www.eventbrite.com/event/123">Rust Meetup</a>"#));
        assert!(row.contains(r#"<span class="eb_event_list_location">Hall B</span>"#));
    }

    #[test]
    fn list_row_without_venue_is_online() {
        let mut event = meetup();
        event.venue = None;
        let row = event_list_row(&event).unwrap();
        assert!(row.contains(r#"<span class="eb_event_list_location">online</span>"#));
    }

    #[test]
    fn list_wraps_rows_and_reports_empty() {
        let list: EventList = serde_json::from_value(json!({
            "events": [{"event": {
                "id": 123, "title": "Rust Meetup", "start_date": "2020-01-10 18:05:00"
            }}]
        }))
        .unwrap();
        let html = event_list(&list, event_list_row).unwrap();
        assert!(html.starts_with("<div class=\"eb_event_list\">\n<div class=\"eb_event_list_item\""));
        assert!(html.ends_with("\n</div>"));

        let empty = event_list(&EventList::default(), event_list_row).unwrap();
        assert_eq!(empty, format!("<div class=\"eb_event_list\">\n{}\n</div>", NO_EVENTS_MESSAGE));
    }

    #[test]
    fn embed_widgets_reference_event_id() {
        let event = meetup();
        assert!(ticket_widget(&event).contains("tickets-external?eid=123&ref=etckt"));
        assert!(registration_widget(&event).contains("event/123?ref=eweb"));
        assert!(calendar_widget(&event).contains("calendar-widget?eid=123"));
        assert!(countdown_widget(&event).contains(">Rust Meetup</a>"));
        assert_eq!(
            button_widget(&event),
            r#"<a href="http://www.eventbrite.com/event/123?ref=ebtn" target="_blank"><img border="0" src="http://www.eventbrite.com/custombutton?eid=123" alt="Register for Rust Meetup on Eventbrite" /></a>"#
        );
    }

    #[test]
    fn link_widget_defaults() {
        let event = meetup();
        assert_eq!(
            link_widget(&event, None, None),
            r#"<a href="http://www.eventbrite.com/event/123?ref=elink" target="_blank" style="color:#000000;">Rust Meetup</a>"#
        );
        assert!(link_widget(&event, Some("Tickets"), Some("#f00")).ends_with(r#"style="color:#f00;">Tickets</a>"#));
    }
}
