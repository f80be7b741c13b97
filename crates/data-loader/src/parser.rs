//! Reading and writing the `::`-separated data files.
//!
//! - users.dat: userId::name::interests::skills::timePerWeek
//!   (interests and skills are comma-separated lists, possibly empty)
//! - courses.dat: courseId::title::description::category
//! - ratings.dat: userId::courseId::rating

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::{FromStr, Split};

const SEPARATOR: &str = "::";

/// Read a file into trimmed, non-empty lines paired with their 1-based line number
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect())
}

/// Name of the file for error messages
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pull the next raw field off a split line
fn next_field<'a>(
    parts: &mut Split<'a, &'static str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Pull the next field off a split line and parse it
fn parse_field<T>(
    parts: &mut Split<'_, &'static str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = next_field(parts, file, line, name)?;
    raw.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Fail if a line carries more fields than its format defines
fn expect_end(parts: &mut Split<'_, &'static str>, expected: usize, line: usize) -> Result<()> {
    let extra = parts.count();
    if extra > 0 {
        return Err(DataLoadError::FieldCountMismatch {
            expected,
            found: expected + extra,
            line,
        });
    }
    Ok(())
}

/// Split a comma-separated list, dropping empty entries
fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the users.dat file
pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    let file = file_name(path);
    let mut users = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split(SEPARATOR);

        let id = parse_field(&mut parts, &file, line_no, "userId")?;
        let name = next_field(&mut parts, &file, line_no, "name")?;
        let interests = next_field(&mut parts, &file, line_no, "interests")?;
        let skills = next_field(&mut parts, &file, line_no, "skills")?;
        let time_per_week = parse_field(&mut parts, &file, line_no, "timePerWeek")?;
        expect_end(&mut parts, 5, line_no)?;

        users.push(User {
            id,
            name: name.to_string(),
            interests: parse_list(interests),
            skills: parse_list(skills),
            time_per_week,
        });
    }

    Ok(users)
}

/// Parse the courses.dat file
pub fn parse_courses(path: &Path) -> Result<Vec<Course>> {
    let file = file_name(path);
    let mut courses = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split(SEPARATOR);

        let id = parse_field(&mut parts, &file, line_no, "courseId")?;
        let title = next_field(&mut parts, &file, line_no, "title")?;
        let description = next_field(&mut parts, &file, line_no, "description")?;
        let category = next_field(&mut parts, &file, line_no, "category")?;
        expect_end(&mut parts, 4, line_no)?;

        courses.push(Course {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        });
    }

    Ok(courses)
}

/// Parse the ratings.dat file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = file_name(path);
    let mut ratings = Vec::new();

    for (line_no, line) in read_lines(path)? {
        let mut parts = line.split(SEPARATOR);

        let user_id = parse_field(&mut parts, &file, line_no, "userId")?;
        let course_id = parse_field(&mut parts, &file, line_no, "courseId")?;
        let rating = parse_field(&mut parts, &file, line_no, "rating")?;
        expect_end(&mut parts, 3, line_no)?;

        ratings.push(Rating {
            user_id,
            course_id,
            rating,
        });
    }

    Ok(ratings)
}

/// Reject text that would corrupt the line format
pub fn check_text(field: &str, value: &str) -> Result<()> {
    if value.contains(SEPARATOR) || value.contains('\n') || value.contains('\r') {
        return Err(DataLoadError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// List items are stored comma-joined, so an item may not contain a comma
fn check_list(field: &str, items: &[String]) -> Result<()> {
    for item in items {
        check_text(field, item)?;
        if item.contains(',') {
            return Err(DataLoadError::InvalidValue {
                field: field.to_string(),
                value: item.clone(),
            });
        }
    }
    Ok(())
}

/// Check that a user can be written to users.dat and read back unchanged
pub fn check_user(user: &User) -> Result<()> {
    check_text("name", &user.name)?;
    check_list("interests", &user.interests)?;
    check_list("skills", &user.skills)
}

/// Check that a course can be written to courses.dat and read back unchanged
pub fn check_course(course: &Course) -> Result<()> {
    check_text("title", &course.title)?;
    check_text("description", &course.description)?;
    check_text("category", &course.category)
}

/// Write users in the users.dat format.
///
/// Every user is checked before the file is opened, so a rejected user
/// leaves the existing file untouched.
pub fn write_users(path: &Path, users: &[&User]) -> Result<()> {
    for user in users {
        check_user(user)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    for user in users {
        writeln!(
            out,
            "{}::{}::{}::{}::{}",
            user.id,
            user.name,
            user.interests.join(","),
            user.skills.join(","),
            user.time_per_week
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write courses in the courses.dat format, checking every course first
pub fn write_courses(path: &Path, courses: &[&Course]) -> Result<()> {
    for course in courses {
        check_course(course)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    for course in courses {
        writeln!(
            out,
            "{}::{}::{}::{}",
            course.id, course.title, course.description, course.category
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Write ratings in the ratings.dat format
pub fn write_ratings(path: &Path, ratings: &[Rating]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for r in ratings {
        writeln!(out, "{}::{}::{}", r.user_id, r.course_id, r.rating)?;
    }
    out.flush()?;
    Ok(())
}
