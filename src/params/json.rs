// ==============================================================================
// Params from serde
// ==============================================================================
//
// Any `Serialize` value is first turned into a `serde_json::Value`, then each
// top-level field is mapped onto a bind parameter. Object key order is kept,
// which matters for query operations.

use serde::Serialize;
use serde_json::{Map, Value as Json};

use super::{Param, Params, Userinfo, Value};
use crate::{
    Error,
    query::{Query, QueryValue},
};

pub(super) fn params_from_serialize<T>(input: &T) -> Result<Params, Error>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_value(input).map_err(|err| Error::InvalidParams(err.to_string()))?;
    let Json::Object(fields) = json else {
        return Err(Error::InvalidParams(format!(
            "expected an object, found {json}"
        )));
    };

    let mut params = Params::new();
    for (key, field) in fields {
        match key.as_str() {
            "?query" => params.query = query(field)?,
            "#fragment" => params.fragment = fragment(field)?,
            _ => {
                let param = param(&key, field)?;
                params.values.insert(key, param);
            }
        }
    }
    Ok(params)
}

fn param(key: &str, field: Json) -> Result<Param, Error> {
    match field {
        Json::Object(mut object) if object.contains_key("value") => {
            let separator = match object.remove("separator") {
                None | Some(Json::Null) => None,
                Some(Json::String(separator)) => Some(separator),
                Some(other) => {
                    return Err(Error::InvalidParams(format!(
                        "the separator of \"{key}\" must be a string, found {other}"
                    )));
                }
            };
            let value = value(key, object.remove("value").unwrap_or(Json::Null))?;
            Ok(Param { value, separator })
        }
        other => Ok(Param {
            value: value(key, other)?,
            separator: None,
        }),
    }
}

fn value(key: &str, field: Json) -> Result<Value, Error> {
    Ok(match field {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => n
            .as_i64()
            .map_or_else(|| Value::Float(n.as_f64().unwrap_or(f64::NAN)), Value::Int),
        Json::String(s) => Value::Str(s),
        Json::Array(items) => Value::List(
            items
                .into_iter()
                .map(|item| value(key, item))
                .collect::<Result<_, _>>()?,
        ),
        Json::Object(object) => Value::Userinfo(userinfo(key, object)?),
    })
}

fn userinfo(key: &str, mut object: Map<String, Json>) -> Result<Userinfo, Error> {
    let mut text = |field: &str| match object.remove(field) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::InvalidParams(format!(
            "the {field} of \"{key}\" must be a string, found {other}"
        ))),
    };
    let user = text("user")?;
    let password = text("password")?;
    if !object.is_empty() {
        return Err(Error::InvalidParams(format!(
            "unsupported object for \"{key}\""
        )));
    }
    Ok(Userinfo { user, password })
}

fn fragment(field: Json) -> Result<Option<String>, Error> {
    match field {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s)),
        other => Err(Error::InvalidParams(format!(
            "\"#fragment\" must be a string, found {other}"
        ))),
    }
}

fn query(field: Json) -> Result<Option<Query>, Error> {
    Ok(match field {
        Json::Null => None,
        Json::String(raw) => Some(Query::Raw(raw)),
        Json::Object(entries) => Some(Query::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key, query_value(value)))
                .collect(),
        )),
        Json::Array(tuples) => Some(Query::Tuples(
            tuples
                .into_iter()
                .map(query_tuple)
                .collect::<Result<_, _>>()?,
        )),
        other => {
            return Err(Error::InvalidParams(format!(
                "\"?query\" must be an object, an array or a string, found {other}"
            )));
        }
    })
}

fn query_tuple(entry: Json) -> Result<Option<(String, QueryValue)>, Error> {
    match entry {
        Json::Array(pair) => match <[Json; 2]>::try_from(pair) {
            Ok([Json::String(key), value]) => Ok(Some((key, query_value(value)))),
            Ok([key, _]) => Err(Error::InvalidParams(format!(
                "query tuple keys must be strings, found {key}"
            ))),
            Err(pair) => Err(Error::InvalidParams(format!(
                "query tuples must have two entries, found {}",
                pair.len()
            ))),
        },
        Json::Null | Json::Bool(false) => Ok(None),
        Json::String(s) if s.is_empty() => Ok(None),
        Json::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        other => Err(Error::InvalidParams(format!(
            "query tuples must be arrays, found {other}"
        ))),
    }
}

fn query_value(value: Json) -> QueryValue {
    match value {
        Json::Null => QueryValue::Null,
        Json::Bool(b) => QueryValue::Bool(b),
        Json::Number(n) => n.as_i64().map_or_else(
            || QueryValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            QueryValue::Int,
        ),
        Json::String(s) => QueryValue::Str(s),
        Json::Array(items) => QueryValue::List(items.into_iter().map(query_value).collect()),
        Json::Object(object) => QueryValue::Str(Json::Object(object).to_string()),
    }
}
