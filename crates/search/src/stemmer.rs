//! Porter stemmer
//!
//! Classic Porter (1980) suffix stripping for English, including the two
//! widely used departures (`bli` -> `ble`, `logi` -> `log`). Operates on
//! lowercase ASCII; any other input is returned unchanged.

/// Stem a lowercase word
///
/// # Example
///
/// ```
/// use libris_search::stemmer::stem;
///
/// assert_eq!(stem("prejudice"), "prejudic");
/// assert_eq!(stem("running"), "run");
/// ```
pub fn stem(word: &str) -> String {
    if word.len() <= 2 || !word.bytes().all(|c| c.is_ascii_lowercase()) {
        return word.to_string();
    }
    let mut s = Stemmer {
        b: word.as_bytes().to_vec(),
        j: 0,
    };
    s.step1ab();
    if s.b.len() > 1 {
        s.step1c();
        s.step2();
        s.step3();
        s.step4();
        s.step5();
    }
    // Only ASCII bytes are ever written
    String::from_utf8(s.b).unwrap_or_else(|_| word.to_string())
}

struct Stemmer {
    /// Word buffer; the last byte is the current end of the word
    b: Vec<u8>,
    /// End of the stem preceding a matched suffix (may be -1)
    j: isize,
}

impl Stemmer {
    fn k(&self) -> isize {
        self.b.len() as isize - 1
    }

    fn at(&self, i: isize) -> u8 {
        self.b[i as usize]
    }

    fn cons(&self, i: isize) -> bool {
        match self.at(i) {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.cons(i - 1),
            _ => true,
        }
    }

    /// Number of VC sequences in b[0..=j]
    fn m(&self) -> usize {
        let mut n = 0;
        let mut i: isize = 0;
        loop {
            if i > self.j {
                return n;
            }
            if !self.cons(i) {
                break;
            }
            i += 1;
        }
        i += 1;
        loop {
            loop {
                if i > self.j {
                    return n;
                }
                if self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
            n += 1;
            loop {
                if i > self.j {
                    return n;
                }
                if !self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..=self.j).any(|i| !self.cons(i))
    }

    fn double_cons(&self, i: isize) -> bool {
        i >= 1 && self.at(i) == self.at(i - 1) && self.cons(i)
    }

    fn cvc(&self, i: isize) -> bool {
        if i < 2 || !self.cons(i) || self.cons(i - 1) || !self.cons(i - 2) {
            return false;
        }
        !matches!(self.at(i), b'w' | b'x' | b'y')
    }

    fn ends(&mut self, suffix: &str) -> bool {
        let suffix = suffix.as_bytes();
        if suffix.len() > self.b.len() || !self.b.ends_with(suffix) {
            return false;
        }
        self.j = self.k() - suffix.len() as isize;
        true
    }

    fn set_to(&mut self, replacement: &str) {
        self.b.truncate((self.j + 1) as usize);
        self.b.extend_from_slice(replacement.as_bytes());
    }

    fn replace_if_measured(&mut self, replacement: &str) {
        if self.m() > 0 {
            self.set_to(replacement);
        }
    }

    fn truncate_to_j(&mut self) {
        self.b.truncate((self.j + 1) as usize);
    }

    fn step1ab(&mut self) {
        if self.b.last() == Some(&b's') {
            if self.ends("sses") {
                let len = self.b.len() - 2;
                self.b.truncate(len);
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.b.len() >= 2 && self.at(self.k() - 1) != b's' {
                self.b.pop();
            }
        }
        if self.ends("eed") {
            if self.m() > 0 {
                self.b.pop();
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.truncate_to_j();
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_cons(self.k()) {
                if !matches!(self.b.last(), Some(b'l') | Some(b's') | Some(b'z')) {
                    self.b.pop();
                }
            } else {
                self.j = self.k();
                if self.m() == 1 && self.cvc(self.k()) {
                    self.b.push(b'e');
                }
            }
        }
    }

    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let k = self.k() as usize;
            self.b[k] = b'i';
        }
    }

    fn step2(&mut self) {
        const RULES: &[(&str, &str)] = &[
            ("ational", "ate"),
            ("tional", "tion"),
            ("enci", "ence"),
            ("anci", "ance"),
            ("izer", "ize"),
            ("bli", "ble"),
            ("alli", "al"),
            ("entli", "ent"),
            ("eli", "e"),
            ("ousli", "ous"),
            ("ization", "ize"),
            ("ation", "ate"),
            ("ator", "ate"),
            ("alism", "al"),
            ("iveness", "ive"),
            ("fulness", "ful"),
            ("ousness", "ous"),
            ("aliti", "al"),
            ("iviti", "ive"),
            ("biliti", "ble"),
            ("logi", "log"),
        ];
        self.apply_rules(RULES);
    }

    fn step3(&mut self) {
        const RULES: &[(&str, &str)] = &[
            ("icate", "ic"),
            ("ative", ""),
            ("alize", "al"),
            ("iciti", "ic"),
            ("ical", "ic"),
            ("ful", ""),
            ("ness", ""),
        ];
        self.apply_rules(RULES);
    }

    /// First matching suffix wins; its replacement applies only when m() > 0
    fn apply_rules(&mut self, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if self.ends(suffix) {
                self.replace_if_measured(replacement);
                return;
            }
        }
    }

    fn step4(&mut self) {
        const SUFFIXES: &[&str] = &[
            "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
            "ou", "ism", "ate", "iti", "ous", "ive", "ize",
        ];
        let mut matched = false;
        for suffix in SUFFIXES {
            if self.ends(suffix) {
                if *suffix == "ion" {
                    // -ion only strips after s or t
                    if self.j >= 0 && matches!(self.at(self.j), b's' | b't') {
                        matched = true;
                        break;
                    }
                    continue;
                }
                matched = true;
                break;
            }
        }
        if matched && self.m() > 1 {
            self.truncate_to_j();
        }
    }

    fn step5(&mut self) {
        self.j = self.k();
        if self.b.last() == Some(&b'e') {
            let a = self.m();
            if a > 1 || (a == 1 && !self.cvc(self.k() - 1)) {
                self.b.pop();
            }
        }
        self.j = self.k();
        if self.b.last() == Some(&b'l') && self.double_cons(self.k()) && self.m() > 1 {
            self.b.pop();
        }
    }
}
