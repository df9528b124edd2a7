//! Orthogonal path routing for connections.
//!
//! `route` is a pure function of the two endpoint shapes and the stored port
//! indices. Nothing here is cached: whenever a shape moves or resizes, the
//! caller recomputes the routes of every connection touching it.

use crate::diagram::Connection;
use crate::geometry::Point;
use crate::shapes::{Shape, ShapeType};

/// Below this vertical offset between endpoints, side-port routes stay straight
const STRAIGHT_THRESHOLD: f64 = 20.0;

/// Horizontal stub length before the vertical turn of a process elbow
const ELBOW_OFFSET: f64 = 32.0;

/// Branch label offset from the source port, toward the branch direction
const LABEL_OFFSET_X: f64 = 16.0;

/// Branch label offset above the source port
const LABEL_OFFSET_Y: f64 = 6.0;

/// Stroke color of a routed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteColor {
    /// Neutral dark, everything except decision branches
    #[default]
    Neutral,
    /// Decision "yes" branch
    Green,
    /// Decision "no" branch
    Red,
}

impl RouteColor {
    /// Convert to a CSS color string for rendering
    pub fn to_css(self) -> &'static str {
        match self {
            RouteColor::Neutral => "#333333",
            RouteColor::Green => "#4caf50",
            RouteColor::Red => "#f44336",
        }
    }
}

/// Branch label of a decision-sourced connection
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLabel {
    pub text: &'static str,
    pub anchor: Point,
}

/// A drawable connection path: an ordered polyline plus display attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<Point>,
    pub color: RouteColor,
    pub label: Option<RouteLabel>,
}

/// Compute the path for `connection` given the current geometry of its two
/// endpoint shapes.
pub fn route(connection: &Connection, from: &Shape, to: &Shape) -> Route {
    // Arrivals at a decision always land on the top port, whatever was stored.
    let to_point = if to.kind == ShapeType::Decision {
        0
    } else {
        connection.to_point
    };
    // A decision-sourced connection on anything but the yes/no ports is
    // normalized to the yes branch. Kept bug-for-bug with the original editor.
    let from_point = if from.kind == ShapeType::Decision && !matches!(connection.from_point, 1 | 2)
    {
        1
    } else {
        connection.from_point
    };

    let start = from.port(from_point).unwrap_or_else(|| from.center());
    let end = to.port(to_point).unwrap_or_else(|| to.center());

    match from.kind {
        ShapeType::Start => neutral(vec![start, end]),
        ShapeType::Process => neutral(process_path(from_point, start, end)),
        ShapeType::Decision => decision_branch(from_point, start, end),
        ShapeType::Input | ShapeType::Document | ShapeType::Comment => {
            neutral(dominant_axis_path(start, end))
        }
    }
}

fn neutral(path: Vec<Point>) -> Route {
    Route {
        path,
        color: RouteColor::Neutral,
        label: None,
    }
}

/// Process-sourced routing: top/bottom ports go straight; side ports elbow
/// around when the destination sits clearly below.
fn process_path(from_point: usize, start: Point, end: Point) -> Vec<Point> {
    match from_point {
        // top/bottom
        0 | 2 => vec![start, end],
        // left/right
        _ => {
            if (end.y - start.y).abs() < STRAIGHT_THRESHOLD || end.y <= start.y {
                vec![start, end]
            } else {
                let dir = if end.x >= start.x { 1.0 } else { -1.0 };
                let turn_x = start.x + dir * ELBOW_OFFSET;
                vec![
                    start,
                    Point::new(turn_x, start.y),
                    Point::new(turn_x, end.y),
                    end,
                ]
            }
        }
    }
}

/// Decision-sourced routing: port 1 is the green "SI" branch, port 2 the red
/// "NO" branch, with the label hugging the source port.
fn decision_branch(from_point: usize, start: Point, end: Point) -> Route {
    let (color, text, dir) = if from_point == 2 {
        (RouteColor::Red, "NO", -1.0)
    } else {
        (RouteColor::Green, "SI", 1.0)
    };

    let path = if (end.y - start.y).abs() < STRAIGHT_THRESHOLD || end.y <= start.y {
        vec![start, end]
    } else {
        vec![start, Point::new(end.x, start.y), end]
    };

    Route {
        path,
        color,
        label: Some(RouteLabel {
            text,
            anchor: Point::new(start.x + dir * LABEL_OFFSET_X, start.y - LABEL_OFFSET_Y),
        }),
    }
}

/// Generic orthogonal route along the dominant axis: a single turn, exiting
/// horizontally when the endpoints are farther apart in x than in y.
fn dominant_axis_path(start: Point, end: Point) -> Vec<Point> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() > dy.abs() {
        vec![start, Point::new(end.x, start.y), end]
    } else {
        vec![start, Point::new(start.x, end.y), end]
    }
}
