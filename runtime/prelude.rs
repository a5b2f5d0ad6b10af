// Runtime prelude for programs compiled from Glitteral.
#![allow(dead_code, unused_mut, unused_variables, unused_parens)]

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::io::{self, Write};

fn add_integers(a: isize, b: isize) -> isize {
    a + b
}

fn subtract_integers(a: isize, b: isize) -> isize {
    a - b
}

fn multiply_integers(a: isize, b: isize) -> isize {
    a * b
}

fn divide_integers(a: isize, b: isize) -> isize {
    a / b
}

fn modulo_integers(a: isize, b: isize) -> isize {
    a % b
}

fn integers_equal(a: isize, b: isize) -> bool {
    a == b
}

fn integers_not_equal(a: isize, b: isize) -> bool {
    a != b
}

fn less(a: isize, b: isize) -> bool {
    a < b
}

fn greater(a: isize, b: isize) -> bool {
    a > b
}

fn not_greater(a: isize, b: isize) -> bool {
    a <= b
}

fn not_less(a: isize, b: isize) -> bool {
    a >= b
}

fn and(p: bool, q: bool) -> bool {
    p && q
}

fn or(p: bool, q: bool) -> bool {
    p || q
}

fn not(p: bool) -> bool {
    !p
}

fn append(list: &mut Vec<isize>, item: isize) {
    list.push(item);
}

fn range(start: isize, end: isize) -> Vec<isize> {
    (start..end).collect()
}

fn list_length(list: &[isize]) -> isize {
    list.len() as isize
}

fn dictionary_length(dictionary: &HashMap<&str, isize>) -> isize {
    dictionary.len() as isize
}

fn list_get_subscript(list: &[isize], index: isize) -> isize {
    list[index as usize]
}

fn dictionary_get_subscript(dictionary: &HashMap<&str, isize>, key: &str) -> isize {
    dictionary[key]
}

fn print<T: Display>(value: T) {
    print!("{}", value);
}

fn println<T: Display>(value: T) {
    println!("{}", value);
}

fn print_integer(value: isize) {
    println!("{}", value);
}

fn println_container<T: Debug + ?Sized>(container: &T) {
    println!("{:?}", container);
}

fn input() -> String {
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
    line.trim_end_matches('\n').to_string()
}
