//! Association synchronizer.
//!
//! # Responsibility
//! - Apply one relationship mutation and mirror it on the opposite side.
//! - Detach an entity from every relationship before it leaves the graph.
//!
//! # Invariants
//! - Mutators are idempotent and return `true` only when state changed.
//! - Mutators on keys absent from the graph are no-ops returning `false`.
//! - Removing a child from an inverse collection nulls the owning reference
//!   only while it still points at that parent.

use super::EntityGraph;
use crate::model::{
    AnyKey, Author, Book, Comment, Contract, Editor, Entity, EntityKind, Genre, Key, Publisher,
    Review, Series, User,
};

/// Owning reference on the child plus the inverse collection on the parent.
struct ManyToOne<C, P> {
    owning: fn(&mut C) -> &mut Option<Key<P>>,
    inverse: fn(&mut P) -> &mut Vec<Key<C>>,
    orphan_removal: bool,
}

struct ManyToMany<A, B> {
    left: fn(&mut A) -> &mut Vec<Key<B>>,
    right: fn(&mut B) -> &mut Vec<Key<A>>,
}

fn book_author(book: &mut Book) -> &mut Option<Key<Author>> {
    &mut book.author
}

fn author_books(author: &mut Author) -> &mut Vec<Key<Book>> {
    &mut author.books
}

fn book_series(book: &mut Book) -> &mut Option<Key<Series>> {
    &mut book.series
}

fn series_books(series: &mut Series) -> &mut Vec<Key<Book>> {
    &mut series.books
}

fn book_publisher(book: &mut Book) -> &mut Option<Key<Publisher>> {
    &mut book.publisher
}

fn publisher_books(publisher: &mut Publisher) -> &mut Vec<Key<Book>> {
    &mut publisher.books
}

fn review_book(review: &mut Review) -> &mut Option<Key<Book>> {
    &mut review.book
}

fn book_reviews(book: &mut Book) -> &mut Vec<Key<Review>> {
    &mut book.reviews
}

fn comment_review(comment: &mut Comment) -> &mut Option<Key<Review>> {
    &mut comment.review
}

fn review_comments(review: &mut Review) -> &mut Vec<Key<Comment>> {
    &mut review.comments
}

fn book_genres(book: &mut Book) -> &mut Vec<Key<Genre>> {
    &mut book.genres
}

fn genre_books(genre: &mut Genre) -> &mut Vec<Key<Book>> {
    &mut genre.books
}

fn book_editors(book: &mut Book) -> &mut Vec<Key<Editor>> {
    &mut book.editors
}

fn editor_books(editor: &mut Editor) -> &mut Vec<Key<Book>> {
    &mut editor.books
}

const BOOK_AUTHOR: ManyToOne<Book, Author> = ManyToOne {
    owning: book_author,
    inverse: author_books,
    orphan_removal: false,
};

const BOOK_SERIES: ManyToOne<Book, Series> = ManyToOne {
    owning: book_series,
    inverse: series_books,
    orphan_removal: false,
};

const BOOK_PUBLISHER: ManyToOne<Book, Publisher> = ManyToOne {
    owning: book_publisher,
    inverse: publisher_books,
    orphan_removal: true,
};

const REVIEW_BOOK: ManyToOne<Review, Book> = ManyToOne {
    owning: review_book,
    inverse: book_reviews,
    orphan_removal: true,
};

const COMMENT_REVIEW: ManyToOne<Comment, Review> = ManyToOne {
    owning: comment_review,
    inverse: review_comments,
    orphan_removal: true,
};

const BOOK_GENRE: ManyToMany<Book, Genre> = ManyToMany {
    left: book_genres,
    right: genre_books,
};

const BOOK_EDITOR: ManyToMany<Book, Editor> = ManyToMany {
    left: book_editors,
    right: editor_books,
};

impl EntityGraph {
    // ---- Author <-> Contract (one-to-one, Contract owns) ----

    /// Sets the owning side of the author/contract link.
    ///
    /// Clears the previous author's back-reference and the new author's
    /// previous contract before linking.
    pub fn set_contract_author(
        &mut self,
        contract: Key<Contract>,
        author: Option<Key<Author>>,
    ) -> bool {
        if !self.contains(contract) || author.is_some_and(|author| !self.contains(author)) {
            return false;
        }
        let Some(previous) = self.contracts.get(contract).map(|value| value.author) else {
            return false;
        };
        if previous == author {
            return false;
        }

        if let Some(old_author) = previous {
            if let Some(value) = self.authors.get_mut(old_author) {
                if value.contract == Some(contract) {
                    value.contract = None;
                }
            }
            self.touch(old_author);
        }

        if let Some(new_author) = author {
            let displaced = self
                .authors
                .get(new_author)
                .and_then(|value| value.contract)
                .filter(|other| *other != contract);
            if let Some(other) = displaced {
                if let Some(value) = self.contracts.get_mut(other) {
                    value.author = None;
                }
                self.touch(other);
            }
            if let Some(value) = self.authors.get_mut(new_author) {
                value.contract = Some(contract);
            }
            self.touch(new_author);
        }

        if let Some(value) = self.contracts.get_mut(contract) {
            value.author = author;
        }
        self.touch(contract);
        true
    }

    /// Inverse-side setter; delegates to [`Self::set_contract_author`].
    pub fn set_author_contract(
        &mut self,
        author: Key<Author>,
        contract: Option<Key<Contract>>,
    ) -> bool {
        let Some(current) = self.authors.get(author).map(|value| value.contract) else {
            return false;
        };
        match contract {
            Some(contract) => self.set_contract_author(contract, Some(author)),
            None => match current {
                Some(current) => self.set_contract_author(current, None),
                None => false,
            },
        }
    }

    // ---- Book -> Author ----

    pub fn set_book_author(&mut self, book: Key<Book>, author: Option<Key<Author>>) -> bool {
        self.set_parent(&BOOK_AUTHOR, book, author)
    }

    pub fn add_author_book(&mut self, author: Key<Author>, book: Key<Book>) -> bool {
        self.set_parent(&BOOK_AUTHOR, book, Some(author))
    }

    pub fn remove_author_book(&mut self, author: Key<Author>, book: Key<Book>) -> bool {
        self.remove_child(&BOOK_AUTHOR, author, book)
    }

    // ---- Book -> Series ----

    pub fn set_book_series(&mut self, book: Key<Book>, series: Option<Key<Series>>) -> bool {
        self.set_parent(&BOOK_SERIES, book, series)
    }

    pub fn add_series_book(&mut self, series: Key<Series>, book: Key<Book>) -> bool {
        self.set_parent(&BOOK_SERIES, book, Some(series))
    }

    pub fn remove_series_book(&mut self, series: Key<Series>, book: Key<Book>) -> bool {
        self.remove_child(&BOOK_SERIES, series, book)
    }

    // ---- Book -> Publisher ----

    pub fn set_book_publisher(
        &mut self,
        book: Key<Book>,
        publisher: Option<Key<Publisher>>,
    ) -> bool {
        self.set_parent(&BOOK_PUBLISHER, book, publisher)
    }

    pub fn add_publisher_book(&mut self, publisher: Key<Publisher>, book: Key<Book>) -> bool {
        self.set_parent(&BOOK_PUBLISHER, book, Some(publisher))
    }

    /// Detaches the book; it is orphan-removed at commit unless re-attached.
    pub fn remove_publisher_book(&mut self, publisher: Key<Publisher>, book: Key<Book>) -> bool {
        self.remove_child(&BOOK_PUBLISHER, publisher, book)
    }

    // ---- Review -> Book ----

    pub fn set_review_book(&mut self, review: Key<Review>, book: Option<Key<Book>>) -> bool {
        self.set_parent(&REVIEW_BOOK, review, book)
    }

    pub fn add_book_review(&mut self, book: Key<Book>, review: Key<Review>) -> bool {
        self.set_parent(&REVIEW_BOOK, review, Some(book))
    }

    pub fn remove_book_review(&mut self, book: Key<Book>, review: Key<Review>) -> bool {
        self.remove_child(&REVIEW_BOOK, book, review)
    }

    // ---- Comment -> Review ----

    pub fn set_comment_review(
        &mut self,
        comment: Key<Comment>,
        review: Option<Key<Review>>,
    ) -> bool {
        self.set_parent(&COMMENT_REVIEW, comment, review)
    }

    pub fn add_review_comment(&mut self, review: Key<Review>, comment: Key<Comment>) -> bool {
        self.set_parent(&COMMENT_REVIEW, comment, Some(review))
    }

    pub fn remove_review_comment(&mut self, review: Key<Review>, comment: Key<Comment>) -> bool {
        self.remove_child(&COMMENT_REVIEW, review, comment)
    }

    // ---- Book <-> Genre, Book <-> Editor ----

    pub fn add_book_genre(&mut self, book: Key<Book>, genre: Key<Genre>) -> bool {
        self.link(&BOOK_GENRE, book, genre)
    }

    pub fn remove_book_genre(&mut self, book: Key<Book>, genre: Key<Genre>) -> bool {
        self.unlink(&BOOK_GENRE, book, genre)
    }

    pub fn add_genre_book(&mut self, genre: Key<Genre>, book: Key<Book>) -> bool {
        self.link(&BOOK_GENRE, book, genre)
    }

    pub fn remove_genre_book(&mut self, genre: Key<Genre>, book: Key<Book>) -> bool {
        self.unlink(&BOOK_GENRE, book, genre)
    }

    pub fn add_book_editor(&mut self, book: Key<Book>, editor: Key<Editor>) -> bool {
        self.link(&BOOK_EDITOR, book, editor)
    }

    pub fn remove_book_editor(&mut self, book: Key<Book>, editor: Key<Editor>) -> bool {
        self.unlink(&BOOK_EDITOR, book, editor)
    }

    pub fn add_editor_book(&mut self, editor: Key<Editor>, book: Key<Book>) -> bool {
        self.link(&BOOK_EDITOR, book, editor)
    }

    pub fn remove_editor_book(&mut self, editor: Key<Editor>, book: Key<Book>) -> bool {
        self.unlink(&BOOK_EDITOR, book, editor)
    }

    // ---- User following / followers ----

    /// Adds `followed` to `follower`'s following set (and `follower` to
    /// `followed`'s followers). Self-follow is a no-op.
    pub fn follow(&mut self, follower: Key<User>, followed: Key<User>) -> bool {
        if !self.contains(follower) || !self.contains(followed) {
            return false;
        }
        let added = self.follows.insert(follower, followed);
        if added {
            self.touch(follower);
            self.touch(followed);
        }
        added
    }

    pub fn unfollow(&mut self, follower: Key<User>, followed: Key<User>) -> bool {
        let removed = self.follows.remove(follower, followed);
        if removed {
            self.touch(follower);
            self.touch(followed);
        }
        removed
    }

    /// Inverse-side add: `follower` starts following `user`.
    pub fn add_follower(&mut self, user: Key<User>, follower: Key<User>) -> bool {
        self.follow(follower, user)
    }

    pub fn remove_follower(&mut self, user: Key<User>, follower: Key<User>) -> bool {
        self.unfollow(follower, user)
    }

    pub fn following(&self, user: Key<User>) -> Vec<Key<User>> {
        self.follows.following(user)
    }

    pub fn followers(&self, user: Key<User>) -> Vec<Key<User>> {
        self.follows.followers(user)
    }

    pub fn is_following(&self, follower: Key<User>, followed: Key<User>) -> bool {
        self.follows.contains(follower, followed)
    }

    // ---- removal ----

    /// Detaches the entity from every relationship and drops it from its
    /// arena. Returns `false` when the key is absent.
    pub(crate) fn purge(&mut self, key: AnyKey) -> bool {
        if !self.contains_any(key) {
            return false;
        }
        match key.kind {
            EntityKind::Author => self.purge_author(Key::new(key.index)),
            EntityKind::Series => {
                let series = Key::<Series>::new(key.index);
                for book in self.series.get(series).map(|v| v.books.clone()).unwrap_or_default() {
                    self.remove_series_book(series, book);
                }
                self.series.remove_at(key.index);
            }
            EntityKind::Publisher => {
                let publisher = Key::<Publisher>::new(key.index);
                let books = self
                    .publishers
                    .get(publisher)
                    .map(|v| v.books.clone())
                    .unwrap_or_default();
                for book in books {
                    self.remove_publisher_book(publisher, book);
                }
                self.publishers.remove_at(key.index);
            }
            EntityKind::Genre => {
                let genre = Key::<Genre>::new(key.index);
                for book in self.genres.get(genre).map(|v| v.books.clone()).unwrap_or_default() {
                    self.remove_genre_book(genre, book);
                }
                self.genres.remove_at(key.index);
            }
            EntityKind::Editor => {
                let editor = Key::<Editor>::new(key.index);
                for book in self.editors.get(editor).map(|v| v.books.clone()).unwrap_or_default() {
                    self.remove_editor_book(editor, book);
                }
                self.editors.remove_at(key.index);
            }
            EntityKind::User => {
                for other in self.follows.purge(Key::new(key.index)) {
                    self.touch(other);
                }
                self.users.remove_at(key.index);
            }
            EntityKind::Contract => {
                self.set_contract_author(Key::new(key.index), None);
                self.contracts.remove_at(key.index);
            }
            EntityKind::Book => self.purge_book(Key::new(key.index)),
            EntityKind::Review => {
                let review = Key::<Review>::new(key.index);
                self.set_review_book(review, None);
                let comments = self
                    .reviews
                    .get(review)
                    .map(|v| v.comments.clone())
                    .unwrap_or_default();
                for comment in comments {
                    self.remove_review_comment(review, comment);
                }
                self.reviews.remove_at(key.index);
            }
            EntityKind::Comment => {
                self.set_comment_review(Key::new(key.index), None);
                self.comments.remove_at(key.index);
            }
        }
        true
    }

    fn purge_author(&mut self, author: Key<Author>) {
        self.set_author_contract(author, None);
        for book in self.authors.get(author).map(|v| v.books.clone()).unwrap_or_default() {
            self.remove_author_book(author, book);
        }
        self.authors.remove_at(author.index());
    }

    fn purge_book(&mut self, book: Key<Book>) {
        self.set_book_author(book, None);
        self.set_book_series(book, None);
        self.set_book_publisher(book, None);
        let Some((genres, editors, reviews)) = self
            .books
            .get(book)
            .map(|v| (v.genres.clone(), v.editors.clone(), v.reviews.clone()))
        else {
            return;
        };
        for genre in genres {
            self.remove_book_genre(book, genre);
        }
        for editor in editors {
            self.remove_book_editor(book, editor);
        }
        for review in reviews {
            self.remove_book_review(book, review);
        }
        self.books.remove_at(book.index());
    }

    // ---- generic helpers ----

    fn set_parent<C: Entity, P: Entity>(
        &mut self,
        link: &ManyToOne<C, P>,
        child: Key<C>,
        parent: Option<Key<P>>,
    ) -> bool {
        if parent.is_some_and(|parent| !self.contains(parent)) {
            return false;
        }
        let previous = {
            let Some(value) = C::arena_mut(self).get_mut(child) else {
                return false;
            };
            let slot = (link.owning)(value);
            if *slot == parent {
                return false;
            }
            std::mem::replace(slot, parent)
        };
        self.touch(child);

        if let Some(old_parent) = previous {
            if let Some(value) = P::arena_mut(self).get_mut(old_parent) {
                (link.inverse)(value).retain(|existing| *existing != child);
            }
            self.touch(old_parent);
        }
        if let Some(new_parent) = parent {
            if let Some(value) = P::arena_mut(self).get_mut(new_parent) {
                let children = (link.inverse)(value);
                if !children.contains(&child) {
                    children.push(child);
                }
            }
            self.touch(new_parent);
            self.orphaned.remove(&child.erase());
        }
        true
    }

    fn remove_child<C: Entity, P: Entity>(
        &mut self,
        link: &ManyToOne<C, P>,
        parent: Key<P>,
        child: Key<C>,
    ) -> bool {
        if !self.contains(child) {
            return false;
        }
        let removed = {
            let Some(value) = P::arena_mut(self).get_mut(parent) else {
                return false;
            };
            let children = (link.inverse)(value);
            let before = children.len();
            children.retain(|existing| *existing != child);
            children.len() != before
        };
        if !removed {
            return false;
        }
        self.touch(parent);

        let detached = match C::arena_mut(self).get_mut(child) {
            Some(value) => {
                let slot = (link.owning)(value);
                if *slot == Some(parent) {
                    *slot = None;
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if detached {
            self.touch(child);
            if link.orphan_removal {
                self.orphaned.insert(child.erase());
            }
        }
        true
    }

    fn link<A: Entity, B: Entity>(
        &mut self,
        relation: &ManyToMany<A, B>,
        left: Key<A>,
        right: Key<B>,
    ) -> bool {
        if !self.contains(left) || !self.contains(right) {
            return false;
        }
        let mut changed = false;
        if let Some(value) = A::arena_mut(self).get_mut(left) {
            let targets = (relation.left)(value);
            if !targets.contains(&right) {
                targets.push(right);
                changed = true;
            }
        }
        if let Some(value) = B::arena_mut(self).get_mut(right) {
            let targets = (relation.right)(value);
            if !targets.contains(&left) {
                targets.push(left);
                changed = true;
            }
        }
        if changed {
            self.touch(left);
            self.touch(right);
        }
        changed
    }

    fn unlink<A: Entity, B: Entity>(
        &mut self,
        relation: &ManyToMany<A, B>,
        left: Key<A>,
        right: Key<B>,
    ) -> bool {
        let mut changed = false;
        if let Some(value) = A::arena_mut(self).get_mut(left) {
            let targets = (relation.left)(value);
            let before = targets.len();
            targets.retain(|existing| *existing != right);
            changed |= targets.len() != before;
        }
        if let Some(value) = B::arena_mut(self).get_mut(right) {
            let targets = (relation.right)(value);
            let before = targets.len();
            targets.retain(|existing| *existing != left);
            changed |= targets.len() != before;
        }
        if changed {
            self.touch(left);
            self.touch(right);
        }
        changed
    }
}
