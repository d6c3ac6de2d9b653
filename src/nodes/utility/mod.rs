//! Utility nodes: conversion and generic pass-through boxes

pub mod generic;
pub mod to_string;

pub use generic::GenericBoxBehavior;
pub use to_string::ToStringBehavior;
