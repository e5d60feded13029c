use std::collections::VecDeque;

use crate::article::{Article, Category};

/// Pick at most `max_count` articles, drawing round-robin across categories.
///
/// Categories are visited in the order they first appear in `articles`, and
/// each category yields its articles in their original order. Input that
/// already fits is returned untouched.
pub fn select_balanced(articles: Vec<Article>, max_count: usize) -> Vec<Article> {
    if articles.len() <= max_count {
        return articles;
    }

    let mut groups: Vec<(Category, VecDeque<Article>)> = Vec::new();
    for article in articles {
        match groups.iter_mut().find(|(c, _)| *c == article.category) {
            Some((_, queue)) => queue.push_back(article),
            None => groups.push((article.category, VecDeque::from([article]))),
        }
    }

    let mut selected = Vec::with_capacity(max_count);
    while selected.len() < max_count {
        let mut drew_any = false;
        for (_, queue) in groups.iter_mut() {
            if selected.len() == max_count {
                break;
            }
            if let Some(article) = queue.pop_front() {
                selected.push(article);
                drew_any = true;
            }
        }
        if !drew_any {
            break;
        }
    }

    selected
}
