macro_rules! int {
    ($val:expr) => {
        $crate::runtime::Value::Int($val)
    };
}

macro_rules! str {
    ($val:expr) => {
        $crate::runtime::Value::Str($val.to_string())
    };
}

pub(crate) use int;
pub(crate) use str;
